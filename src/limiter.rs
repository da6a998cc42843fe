// ABOUTME: Resource limiter enforcing statement, loop, call-depth, and
// ABOUTME: wall-clock quotas for one execution

use crate::config::ExecutionOptions;
use crate::error::{ExecError, ExecErrorKind};
use std::time::{Duration, Instant};

/// Monotonic counters plus a stopwatch, consulted at every statement, loop
/// iteration, and call boundary. One limiter lives for one execution; nested
/// script calls share it, so quotas bound the whole call tree.
#[derive(Debug)]
pub struct ResourceLimiter {
    max_wall_time: Duration,
    max_statements: u64,
    max_loop_iterations: u64,
    max_call_depth: u32,
    max_script_call_depth: u32,
    started: Instant,
    statements: u64,
    loop_iterations: u64,
    call_depth: u32,
    max_observed_call_depth: u32,
    script_call_depth: u32,
    function_calls: u64,
}

impl ResourceLimiter {
    pub fn new(options: &ExecutionOptions) -> Self {
        ResourceLimiter {
            max_wall_time: options.max_wall_time,
            max_statements: options.max_statements,
            max_loop_iterations: options.max_loop_iterations,
            max_call_depth: options.max_call_depth,
            max_script_call_depth: options.max_script_call_depth,
            started: Instant::now(),
            statements: 0,
            loop_iterations: 0,
            call_depth: 0,
            max_observed_call_depth: 0,
            script_call_depth: 0,
            function_calls: 0,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn statements(&self) -> u64 {
        self.statements
    }

    pub fn loop_iterations(&self) -> u64 {
        self.loop_iterations
    }

    pub fn function_calls(&self) -> u64 {
        self.function_calls
    }

    pub fn max_observed_call_depth(&self) -> u32 {
        self.max_observed_call_depth
    }

    fn check_wall_clock(&self) -> Result<(), ExecError> {
        let elapsed = self.started.elapsed();
        if elapsed > self.max_wall_time {
            return Err(ExecErrorKind::TimeLimit(elapsed).into());
        }
        Ok(())
    }

    /// Called before each statement executes.
    pub fn count_statement(&mut self) -> Result<(), ExecError> {
        self.statements += 1;
        if self.statements > self.max_statements {
            return Err(ExecErrorKind::StatementLimit(self.max_statements).into());
        }
        self.check_wall_clock()
    }

    /// Called at the top of every loop iteration. Counts total iterations
    /// across all loops, not concurrent ones.
    pub fn enter_loop_iteration(&mut self) -> Result<(), ExecError> {
        self.loop_iterations += 1;
        if self.loop_iterations > self.max_loop_iterations {
            return Err(ExecErrorKind::LoopLimit(self.max_loop_iterations).into());
        }
        self.check_wall_clock()
    }

    /// Brackets a function invocation.
    pub fn enter_call(&mut self) -> Result<(), ExecError> {
        self.call_depth += 1;
        self.function_calls += 1;
        self.max_observed_call_depth = self.max_observed_call_depth.max(self.call_depth);
        if self.call_depth > self.max_call_depth {
            return Err(ExecErrorKind::CallDepthLimit(self.max_call_depth).into());
        }
        self.check_wall_clock()
    }

    pub fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    /// Brackets a nested script invocation through the resolver.
    pub fn enter_script_call(&mut self) -> Result<(), ExecError> {
        self.script_call_depth += 1;
        if self.script_call_depth > self.max_script_call_depth {
            return Err(ExecErrorKind::ScriptCallDepthLimit(self.max_script_call_depth).into());
        }
        self.check_wall_clock()
    }

    pub fn exit_script_call(&mut self) {
        self.script_call_depth = self.script_call_depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter_with(f: impl FnOnce(ExecutionOptions) -> ExecutionOptions) -> ResourceLimiter {
        ResourceLimiter::new(&f(ExecutionOptions::default()))
    }

    #[test]
    fn test_statement_limit() {
        let mut limiter = limiter_with(|o| o.with_max_statements(3));
        assert!(limiter.count_statement().is_ok());
        assert!(limiter.count_statement().is_ok());
        assert!(limiter.count_statement().is_ok());
        let err = limiter.count_statement().unwrap_err();
        assert_eq!(err.kind, ExecErrorKind::StatementLimit(3));
    }

    #[test]
    fn test_loop_limit_counts_total_iterations() {
        let mut limiter = limiter_with(|o| o.with_max_loop_iterations(2));
        assert!(limiter.enter_loop_iteration().is_ok());
        assert!(limiter.enter_loop_iteration().is_ok());
        let err = limiter.enter_loop_iteration().unwrap_err();
        assert_eq!(err.kind, ExecErrorKind::LoopLimit(2));
    }

    #[test]
    fn test_call_depth_recovers_on_exit() {
        let mut limiter = limiter_with(|o| o.with_max_call_depth(2));
        assert!(limiter.enter_call().is_ok());
        assert!(limiter.enter_call().is_ok());
        assert!(limiter.enter_call().is_err());
        limiter.exit_call();
        limiter.exit_call();
        limiter.exit_call();
        assert!(limiter.enter_call().is_ok());
        assert_eq!(limiter.max_observed_call_depth(), 3);
    }

    #[test]
    fn test_script_call_depth() {
        let mut limiter = limiter_with(|o| o.with_max_script_call_depth(1));
        assert!(limiter.enter_script_call().is_ok());
        let err = limiter.enter_script_call().unwrap_err();
        assert_eq!(err.kind, ExecErrorKind::ScriptCallDepthLimit(1));
    }

    #[test]
    fn test_wall_clock_breach() {
        let mut limiter = limiter_with(|o| o.with_max_wall_time(Duration::ZERO));
        std::thread::sleep(Duration::from_millis(2));
        let err = limiter.count_statement().unwrap_err();
        assert!(matches!(err.kind, ExecErrorKind::TimeLimit(_)));
    }
}
