use std::fmt::Arguments;
use std::io::Write;

///
/// Receives human-readable progress output of a running benchmark.
///
/// This is separate from the diagnostics emitted via `tracing`, since it is
/// part of the user-facing behavior selected by the `verbose` option.
///
pub trait BenchmarkObserver: Clone {

    fn log(&self, args: Arguments);
}

#[macro_export]
macro_rules! log_progress {
    ($observer:expr, $($args:tt)*) => {
        ($observer).log(std::format_args!($($args)*))
    };
}

///
/// Prints progress to stdout.
///
/// We use a wrapper around `print!` instead of just `Stdout`, since
/// this works with output capture in tests.
///
#[derive(Clone, Copy, Debug, Default)]
pub struct LogProgress;

impl BenchmarkObserver for LogProgress {

    fn log(&self, args: Arguments) {
        print!("{}", args);
        let _ = std::io::stdout().flush();
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DontObserve;

impl BenchmarkObserver for DontObserve {

    fn log(&self, _args: Arguments) {}
}

#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::rc::Rc;

///
/// Collects all progress output, for tests.
///
#[cfg(test)]
#[derive(Clone, Default)]
pub struct RecordProgress {
    pub output: Rc<RefCell<String>>
}

#[cfg(test)]
impl BenchmarkObserver for RecordProgress {

    fn log(&self, args: Arguments) {
        use std::fmt::Write;
        self.output.borrow_mut().write_fmt(args).unwrap();
    }
}

#[test]
fn test_log_progress() {
    let observer = RecordProgress::default();
    log_progress!(observer, "p = {}, n = {}\n", 3, 5);
    log_progress!(DontObserve, "ignored {}", 1);
    log_progress!(LogProgress, "");
    assert_eq!("p = 3, n = 5\n", observer.output.borrow().as_str());
}
