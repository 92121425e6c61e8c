use std::io;

use crate::field::FieldBackend;
use crate::isomorphism::AttemptError;

///
/// Refers to an object that lives inside a running CAS process.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CasHandle(pub usize);

///
/// A running instance of an external computer algebra system that can compute
/// embeddings of finite fields.
///
pub trait CasSession<S: FieldBackend> {

    ///
    /// Transfers the given field into the CAS, returning a handle to the CAS-side object.
    ///
    fn load(&mut self, field: &S::Field) -> Result<CasHandle, AttemptError>;

    ///
    /// Computes an embedding of the field `source` into `target`.
    ///
    fn embed(&mut self, source: CasHandle, target: CasHandle) -> Result<(), AttemptError>;

    ///
    /// Terminates the CAS process. Called exactly once per session.
    ///
    fn quit(&mut self) -> io::Result<()>;
}

///
/// Starts fresh CAS processes. Starting a new process for each attempt is assumed to be
/// cheaper than tearing down the state a previous attempt left behind.
///
pub trait CasService<S: FieldBackend> {

    fn start(&mut self) -> io::Result<Box<dyn CasSession<S> + '_>>;
}

///
/// A scoped CAS process. The process is terminated by [`CasInstance::release()`], or
/// on drop if it was not released explicitly, e.g. because an error was propagated.
///
pub struct CasInstance<'a, S: FieldBackend> {
    session: Box<dyn CasSession<S> + 'a>,
    released: bool
}

impl<'a, S: FieldBackend> CasInstance<'a, S> {

    pub fn start<C>(service: &'a mut C) -> io::Result<Self>
        where C: ?Sized + CasService<S>
    {
        Ok(CasInstance {
            session: service.start()?,
            released: false
        })
    }

    pub fn load(&mut self, field: &S::Field) -> Result<CasHandle, AttemptError> {
        self.session.load(field)
    }

    pub fn embed(&mut self, source: CasHandle, target: CasHandle) -> Result<(), AttemptError> {
        self.session.embed(source, target)
    }

    pub fn release(mut self) -> io::Result<()> {
        self.released = true;
        self.session.quit()
    }
}

impl<'a, S: FieldBackend> Drop for CasInstance<'a, S> {

    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            if let Err(err) = self.session.quit() {
                tracing::warn!(%err, "failed to terminate CAS process");
            }
        }
    }
}

///
/// Reaps all terminated child processes of this process, which the interfaces to
/// external systems tend to leave behind as zombies.
///
/// This is idempotent, and returns as soon as there are no more terminated children.
/// In particular, having no children at all (`ECHILD`) is not an error.
///
#[stability::unstable(feature = "enable")]
pub fn reap_orphaned_children() -> usize {
    let mut reaped = 0;
    #[cfg(unix)]
    loop {
        let mut status: libc::c_int = 0;
        // SAFETY: `waitpid` only writes to `status`, which is a valid local
        let pid = unsafe { libc::waitpid(-1, &mut status, libc::WNOHANG) };
        if pid > 0 {
            reaped += 1;
            continue;
        } else if pid < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::ECHILD) {
                tracing::debug!(%err, "waitpid failed while reaping children");
            }
        }
        break;
    }
    return reaped;
}

#[cfg(test)]
use crate::testing::*;
#[cfg(test)]
use crate::params::ParameterPair;

#[test]
fn test_release_once() {
    let mut service = MockCas::new();
    let field = MockBackend::new().canonical_field(ParameterPair { p: 3, n: 5 });
    let mut instance = CasInstance::<MockBackend>::start(&mut service).unwrap();
    let a = instance.load(&field).unwrap();
    let b = instance.load(&field).unwrap();
    instance.embed(a, b).unwrap();
    instance.release().unwrap();
    assert_eq!(1, service.log.started());
    assert_eq!(1, service.log.quit());
    assert_eq!(1, service.log.embedded());
}

#[test]
fn test_release_on_drop() {
    let mut service = MockCas::confused();
    let field = MockBackend::new().canonical_field(ParameterPair { p: 3, n: 5 });
    let result = (|| {
        let mut instance = CasInstance::<MockBackend>::start(&mut service)?;
        let a = instance.load(&field)?;
        instance.embed(a, a)?;
        instance.release()?;
        Ok::<_, AttemptError>(())
    })();
    assert!(matches!(result, Err(AttemptError::InterfaceConfusion(_))));
    assert_eq!(1, service.log.started());
    assert_eq!(1, service.log.quit());
}

#[test]
fn test_start_failure() {
    let mut service = MockCas::unavailable();
    assert!(CasInstance::<MockBackend>::start(&mut service).is_err());
    assert_eq!(0, service.log.quit());
}

#[cfg(unix)]
#[test]
fn test_reap_terminated_child() {
    let child = std::process::Command::new("true").spawn();
    if let Ok(child) = child {
        let pid = child.id() as libc::pid_t;
        // wait until the child has terminated, without reaping it; it might
        // also have been reaped concurrently by another test already
        let mut info: libc::siginfo_t = unsafe { std::mem::zeroed() };
        unsafe { libc::waitid(libc::P_PID, pid as libc::id_t, &mut info, libc::WEXITED | libc::WNOWAIT) };
        reap_orphaned_children();
        let mut status: libc::c_int = 0;
        assert_eq!(-1, unsafe { libc::waitpid(pid, &mut status, libc::WNOHANG) });
        reap_orphaned_children();
    }
}
