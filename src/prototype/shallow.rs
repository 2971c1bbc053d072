// Shallow cloning: duplicate the fields, share whatever they point to.
//
// In Rust this is what `Clone` does for a struct whose sub-objects sit
// behind `Arc`/`Rc`: owned fields are copied, the pointers are copied, and
// the pointees are shared. A type that must not be duplicated simply keeps
// the default method, which reports `CloneUnsupported`.

use crate::error::CloneError;

pub trait ShallowClone: Sized {
    fn shallow_clone(&self) -> Result<Self, CloneError> {
        Err(CloneError::clone_unsupported::<Self>())
    }
}

/// Implements [`ShallowClone`] through the type's `Clone` impl.
#[macro_export]
macro_rules! impl_shallow_clone {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::prototype::ShallowClone for $ty {
                fn shallow_clone(&self) -> Result<Self, $crate::error::CloneError> {
                    Ok(::std::clone::Clone::clone(self))
                }
            }
        )+
    };
}
