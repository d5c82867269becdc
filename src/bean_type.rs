//! Runtime type identity of beans and injection targets.

use std::any::TypeId;
use std::fmt;

/// Type identity of a bean or of an injection target's element type.
///
/// Pairs the [`TypeId`] used for matching with the type name used in
/// diagnostics. Works for unsized targets such as `dyn Trait`.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::BeanType;
///
/// trait Greeter: Send + Sync {}
///
/// let string = BeanType::of::<String>();
/// assert_eq!(string.name(), "alloc::string::String");
/// assert_eq!(string, BeanType::of::<String>());
/// assert_ne!(string, BeanType::of::<dyn Greeter>());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BeanType {
    id: TypeId,
    name: &'static str,
}

impl BeanType {
    /// Type identity of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying [`TypeId`].
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The type name, as given by [`std::any::type_name`].
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for BeanType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BeanType {}

impl std::hash::Hash for BeanType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Names are diagnostics only, identity is the TypeId
        self.id.hash(state);
    }
}

impl fmt::Display for BeanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
