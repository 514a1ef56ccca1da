//! The dispatch seam every target implements.
//!
//! Rust has no missing-method hook, so operations are sent by name: a
//! receiver gets the operation name, its positional arguments and an
//! optional trailing callback, and decides for itself what to do with them.
//! Anything implementing [`Receiver`] can be wrapped, recorded and replayed.

use crate::errors::CallError;
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Result of sending one operation to a receiver.
pub type Outcome = Result<Value, CallError>;

/// Shared handle to the current target.
///
/// `Rc<RefCell<..>>` keeps the whole recorder single-threaded: the handle is
/// neither `Send` nor `Sync`, so cross-thread use does not compile.
pub type SharedTarget = Rc<RefCell<dyn Receiver>>;

pub trait Receiver {
    fn send(&mut self, name: &str, args: &[Value], callback: Option<&Callback>) -> Outcome;

    /// Capability probe used to avoid wrapping a recording facade twice.
    fn is_proxy(&self) -> bool {
        false
    }
}

/// Wrap a receiver in a shared handle. Keep a clone of the returned `Rc` to
/// use the target directly; it coerces to [`SharedTarget`].
pub fn shared<R: Receiver + 'static>(receiver: R) -> Rc<RefCell<R>> {
    Rc::new(RefCell::new(receiver))
}

type CallbackFn = dyn Fn(&mut dyn Receiver, &[Value]) -> Outcome;

/// Trailing callable attached to an operation.
///
/// Clones share the same callable, and equality is identity: two callbacks
/// built from identical closures never compare equal.
#[derive(Clone)]
pub struct Callback {
    inner: Rc<CallbackFn>,
}

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut dyn Receiver, &[Value]) -> Outcome + 'static,
    {
        Self { inner: Rc::new(f) }
    }

    /// Callback that sends `name`, without arguments, back to whichever
    /// receiver invokes it. The yielded arguments are ignored.
    pub fn forward(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(move |receiver, _args| receiver.send(&name, &[], None))
    }

    pub fn call(&self, receiver: &mut dyn Receiver, args: &[Value]) -> Outcome {
        (self.inner)(receiver, args)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.inner).cast::<()>())
    }
}
