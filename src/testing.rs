use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::cas::{CasHandle, CasService, CasSession};
use crate::field::{FieldBackend, FieldPair};
use crate::isomorphism::*;
use crate::params::ParameterPair;
use crate::suite::AlgorithmSuite;

///
/// Spins until the clock has advanced, so that every mocked algorithm call
/// takes a measurable amount of time.
///
pub fn busy_tick() {
    let start = Instant::now();
    while start.elapsed().is_zero() {
        std::hint::spin_loop();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockField {
    pub params: ParameterPair,
    pub modulus: Vec<u64>
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    pub minpoly: Vec<u64>
}

///
/// A field backend that does no arithmetic at all; an element just stores its
/// minimal polynomial.
///
pub struct MockBackend {
    constructed: Cell<usize>
}

impl MockBackend {

    pub fn new() -> Self {
        MockBackend { constructed: Cell::new(0) }
    }

    ///
    /// The number of random fields created so far.
    ///
    pub fn constructed(&self) -> usize {
        self.constructed.get()
    }
}

impl FieldBackend for MockBackend {

    type Field = MockField;
    type Element = MockElement;
    type Poly = Vec<u64>;

    fn canonical_field(&self, params: ParameterPair) -> MockField {
        let mut modulus = (0..params.n).map(|i| (i + 1) % params.p).collect::<Vec<_>>();
        modulus.push(1);
        MockField { params, modulus }
    }

    fn random_field(&self, params: ParameterPair, rng: &mut oorandom::Rand64) -> MockField {
        self.constructed.set(self.constructed.get() + 1);
        let canonical = self.canonical_field(params).modulus;
        for _ in 0..1000 {
            let mut modulus = (0..params.n).map(|_| rng.rand_range(0..params.p)).collect::<Vec<_>>();
            modulus.push(1);
            if modulus != canonical {
                return MockField { params, modulus };
            }
        }
        unreachable!("cannot draw a random modulus for {}", params)
    }

    fn minpoly(&self, _field: &MockField, el: &MockElement) -> Vec<u64> {
        el.minpoly.clone()
    }

    fn degree(&self, poly: &Vec<u64>) -> usize {
        poly.len() - 1
    }
}

pub fn correct_generators(fields: &FieldPair<MockField>) -> Generators<MockBackend> {
    let minpoly = fields.canonical.modulus.clone();
    (MockElement { minpoly: minpoly.clone() }, MockElement { minpoly })
}

pub fn mismatched_generators(fields: &FieldPair<MockField>) -> Generators<MockBackend> {
    (MockElement { minpoly: fields.canonical.modulus.clone() }, MockElement { minpoly: fields.randomized.modulus.clone() })
}

///
/// Generators of the prime field, whose minimal polynomials have degree `1`.
///
pub fn subfield_generators(_fields: &FieldPair<MockField>) -> Generators<MockBackend> {
    (MockElement { minpoly: vec![1, 1] }, MockElement { minpoly: vec![1, 1] })
}

///
/// Records which mocked algorithms were called, shared between all mocks of a
/// [`MockSuite`].
///
#[derive(Clone, Default)]
pub struct CallLog {
    families: Rc<RefCell<Vec<Family>>>,
    kummer_variants: Rc<RefCell<Vec<String>>>
}

impl CallLog {

    fn record(&self, family: Family) {
        self.families.borrow_mut().push(family);
    }

    pub fn get(&self, family: Family) -> usize {
        self.families.borrow().iter().filter(|f| **f == family).count()
    }

    pub fn kummer_total(&self) -> usize {
        self.kummer_variants.borrow().len()
    }

    pub fn kummer_variants(&self) -> Vec<String> {
        self.kummer_variants.borrow().clone()
    }

    pub fn total(&self) -> usize {
        self.families.borrow().len() + self.kummer_total()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Correct,
    Mismatched,
    WrongDegree
}

impl Behavior {

    fn generators(&self, source: &MockField, target: &MockField) -> Generators<MockBackend> {
        let fields = FieldPair { canonical: source.clone(), randomized: target.clone() };
        match self {
            Behavior::Correct => correct_generators(&fields),
            Behavior::Mismatched => mismatched_generators(&fields),
            Behavior::WrongDegree => subfield_generators(&fields)
        }
    }
}

pub struct MockAlgorithm {
    behavior: Behavior,
    log: Option<(CallLog, Family)>
}

impl MockAlgorithm {

    pub fn correct() -> Self {
        MockAlgorithm { behavior: Behavior::Correct, log: None }
    }

    pub fn mismatched() -> Self {
        MockAlgorithm { behavior: Behavior::Mismatched, log: None }
    }

    pub fn wrong_degree() -> Self {
        MockAlgorithm { behavior: Behavior::WrongDegree, log: None }
    }

    pub fn logged(mut self, calls: &CallLog, family: Family) -> Self {
        self.log = Some((calls.clone(), family));
        self
    }

    pub fn generators(&mut self, fields: &FieldPair<MockField>) -> Result<Generators<MockBackend>, AttemptError> {
        self.find_generators(&fields.canonical, &fields.randomized)
    }
}

impl IsomorphismAlgorithm<MockBackend> for MockAlgorithm {

    fn find_generators(&mut self, source: &MockField, target: &MockField) -> Result<Generators<MockBackend>, AttemptError> {
        if let Some((calls, family)) = &self.log {
            calls.record(*family);
        }
        busy_tick();
        Ok(self.behavior.generators(source, target))
    }
}

pub struct MockRains {
    calls: CallLog
}

impl CyclotomicRains<MockBackend> for MockRains {

    fn find_generators(&mut self, source: &MockField, target: &MockField, variant: CyclotomicVariant) -> Result<Generators<MockBackend>, AttemptError> {
        self.calls.record(match variant {
            CyclotomicVariant::Plain => Family::RainsCyclotomic,
            CyclotomicVariant::Lucas => Family::RainsLucas
        });
        busy_tick();
        Ok(Behavior::Correct.generators(source, target))
    }
}

pub struct MockKummer {
    calls: CallLog
}

impl KummerAlgorithm<MockBackend> for MockKummer {

    fn find_generators(&mut self, source: &MockField, target: &MockField, degree: u64, variant: &KummerVariant) -> Result<Generators<MockBackend>, AttemptError> {
        assert_eq!(source.params.n, degree);
        self.calls.kummer_variants.borrow_mut().push(variant.name.clone());
        busy_tick();
        Ok(Behavior::Correct.generators(source, target))
    }
}

#[derive(Clone, Default)]
pub struct CasLog {
    started: Rc<Cell<usize>>,
    quit: Rc<Cell<usize>>,
    embedded: Rc<Cell<usize>>
}

impl CasLog {

    pub fn started(&self) -> usize {
        self.started.get()
    }

    pub fn quit(&self) -> usize {
        self.quit.get()
    }

    pub fn embedded(&self) -> usize {
        self.embedded.get()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CasBehavior {
    Working,
    Confused,
    Unavailable,
    Unkillable,
    SlowLoad(Duration)
}

pub struct MockCas {
    behavior: CasBehavior,
    pub log: CasLog
}

impl MockCas {

    pub fn new() -> Self {
        MockCas { behavior: CasBehavior::Working, log: CasLog::default() }
    }

    ///
    /// Starts fine, but every embedding fails with an interface error.
    ///
    pub fn confused() -> Self {
        MockCas { behavior: CasBehavior::Confused, log: CasLog::default() }
    }

    pub fn unavailable() -> Self {
        MockCas { behavior: CasBehavior::Unavailable, log: CasLog::default() }
    }

    ///
    /// Works, but terminating the process always fails.
    ///
    pub fn unkillable() -> Self {
        MockCas { behavior: CasBehavior::Unkillable, log: CasLog::default() }
    }

    ///
    /// Works, but transferring a field into the CAS takes at least `delay`.
    ///
    pub fn slow_load(delay: Duration) -> Self {
        MockCas { behavior: CasBehavior::SlowLoad(delay), log: CasLog::default() }
    }
}

struct MockCasSession {
    behavior: CasBehavior,
    log: CasLog,
    loaded: usize
}

impl CasSession<MockBackend> for MockCasSession {

    fn load(&mut self, _field: &MockField) -> Result<CasHandle, AttemptError> {
        if let CasBehavior::SlowLoad(delay) = self.behavior {
            std::thread::sleep(delay);
        }
        self.loaded += 1;
        Ok(CasHandle(self.loaded - 1))
    }

    fn embed(&mut self, source: CasHandle, target: CasHandle) -> Result<(), AttemptError> {
        assert!(source.0 < self.loaded && target.0 < self.loaded);
        busy_tick();
        match self.behavior {
            CasBehavior::Confused => Err(AttemptError::InterfaceConfusion("TypeError: unsupported operand".to_owned())),
            _ => {
                self.log.embedded.set(self.log.embedded.get() + 1);
                Ok(())
            }
        }
    }

    fn quit(&mut self) -> io::Result<()> {
        self.log.quit.set(self.log.quit.get() + 1);
        match self.behavior {
            CasBehavior::Unkillable => Err(io::Error::new(io::ErrorKind::Other, "quit failed")),
            _ => Ok(())
        }
    }
}

impl CasService<MockBackend> for MockCas {

    fn start(&mut self) -> io::Result<Box<dyn CasSession<MockBackend> + '_>> {
        if self.behavior == CasBehavior::Unavailable {
            return Err(io::Error::new(io::ErrorKind::Other, "cannot fork"));
        }
        self.log.started.set(self.log.started.get() + 1);
        Ok(Box::new(MockCasSession { behavior: self.behavior, log: self.log.clone(), loaded: 0 }))
    }
}

///
/// An [`AlgorithmSuite`] in which all algorithms are mocks that return correct
/// results, together with logs of the calls made to them.
///
pub struct MockSuite {
    pub suite: AlgorithmSuite<'static, MockBackend, MockBackend>,
    pub calls: CallLog,
    pub cas_log: CasLog
}

impl MockSuite {

    pub fn new<F>(root_order: F) -> Self
        where F: 'static + FnMut(ParameterPair) -> u64
    {
        Self::with_cas(root_order, MockCas::new())
    }

    pub fn with_cas<F>(root_order: F, cas: MockCas) -> Self
        where F: 'static + FnMut(ParameterPair) -> u64
    {
        let calls = CallLog::default();
        let cas_log = cas.log.clone();
        MockSuite {
            suite: AlgorithmSuite {
                symbolic: MockBackend::new(),
                native: MockBackend::new(),
                root_order: Box::new(root_order),
                cas_embed: Box::new(cas),
                rains_cyclotomic: Box::new(MockRains { calls: calls.clone() }),
                rains_elliptic: Box::new(MockAlgorithm::correct().logged(&calls, Family::RainsElliptic)),
                cas_library: Box::new(MockAlgorithm::correct().logged(&calls, Family::CasLibrary)),
                kummer: Box::new(MockKummer { calls: calls.clone() })
            },
            calls,
            cas_log
        }
    }
}
