//! Thread-scoped validation context stack.
//!
//! Validating under a context pushes the context name for the duration of
//! the call, so nested validations of related subjects pick it up without it
//! being passed around. Each thread has its own stack; a [`ContextScope`]
//! pops its entry when dropped, including during unwinding.

use std::cell::RefCell;
use std::marker::PhantomData;
use tracing::debug;

thread_local! {
    static STACK: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// RAII guard for one pushed context.
///
/// Not `Send`: the entry lives on the stack of the thread that pushed it.
#[must_use = "the context is popped as soon as the scope is dropped"]
#[derive(Debug)]
pub struct ContextScope {
    name: String,
    _thread_bound: PhantomData<*const ()>,
}

impl ContextScope {
    /// Push `name` onto the current thread's stack.
    pub fn enter(name: impl Into<String>) -> Self {
        let name = name.into();
        STACK.with(|stack| stack.borrow_mut().push(name.clone()));
        debug!(context = %name, depth = depth(), "entered validation context");
        Self {
            name,
            _thread_bound: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
        debug!(context = %self.name, depth = depth(), "left validation context");
    }
}

/// Run `f` with `name` pushed as the current context.
///
/// # Example
///
/// ```rust
/// use validity::core::context;
///
/// assert_eq!(context::current(), None);
/// context::with_context("signup", || {
///     assert_eq!(context::current().as_deref(), Some("signup"));
///     context::with_context("billing", || {
///         assert_eq!(context::current().as_deref(), Some("billing"));
///     });
///     assert_eq!(context::current().as_deref(), Some("signup"));
/// });
/// assert_eq!(context::current(), None);
/// ```
pub fn with_context<R>(name: impl Into<String>, f: impl FnOnce() -> R) -> R {
    let _scope = ContextScope::enter(name);
    f()
}

/// Innermost context on this thread's stack.
pub fn current() -> Option<String> {
    STACK.with(|stack| stack.borrow().last().cloned())
}

/// Number of contexts pushed on this thread.
pub fn depth() -> usize {
    STACK.with(|stack| stack.borrow().len())
}

/// Whether any context is pushed on this thread.
pub fn any() -> bool {
    depth() > 0
}
