//! Bean scope definitions.

use std::fmt;
use std::str::FromStr;

use crate::error::DiError;

/// Bean scopes controlling when instances are created and how they are shared
///
/// Each scope answers four questions: is the bean created eagerly during
/// [`Container::initialize`](crate::Container::initialize), is the created
/// instance cached, may it be injected into other beans, and may it be
/// retrieved through the generic lookup operations.
///
/// | Scope       | Eager | Cached | Injectable | Retrievable |
/// |-------------|-------|--------|------------|-------------|
/// | `Singleton` | yes   | yes    | yes        | yes         |
/// | `Prototype` | no    | no     | yes        | yes         |
/// | `Request`   | no    | no     | no         | no          |
///
/// Scopes also have a literal form (`"singleton"`, `"prototype"`,
/// `"request"`) used when a bean declares its scope by name.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::Scope;
///
/// let scope: Scope = "prototype".parse().unwrap();
/// assert_eq!(scope, Scope::Prototype);
/// assert!(!scope.is_eager());
/// assert!(scope.is_injectable());
///
/// let err = "session".parse::<Scope>().unwrap_err();
/// assert_eq!(err.to_string(), "unsupported scope: session");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum Scope {
    /// Exactly one instance per container lifetime
    ///
    /// Created eagerly during initialization (unless the instance was supplied
    /// pre-built at registration) and cached until the container is closed.
    #[default]
    Singleton,
    /// Fresh instance on every resolution
    ///
    /// Both direct lookups and injections into other beans create a new,
    /// independently wired and initialized instance. Never cached.
    Prototype,
    /// Instance bound to an externally supplied lifetime context
    ///
    /// Created on demand by the request collaborator (see
    /// [`RequestScope`](crate::request::RequestScope)), closed when its
    /// context is done. Never injected and never returned by the generic
    /// lookups.
    Request,
}

impl Scope {
    /// Literal form of the scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Singleton => "singleton",
            Scope::Prototype => "prototype",
            Scope::Request => "request",
        }
    }

    /// Whether beans of this scope are created during initialization.
    pub fn is_eager(&self) -> bool {
        matches!(self, Scope::Singleton)
    }

    /// Whether a created instance is kept for later resolutions.
    pub fn is_cached(&self) -> bool {
        matches!(self, Scope::Singleton)
    }

    /// Whether beans of this scope may be injected into other beans.
    pub fn is_injectable(&self) -> bool {
        !matches!(self, Scope::Request)
    }

    /// Whether beans of this scope may be looked up by id.
    pub fn is_retrievable(&self) -> bool {
        !matches!(self, Scope::Request)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = DiError;

    fn from_str(literal: &str) -> Result<Self, Self::Err> {
        match literal {
            "singleton" => Ok(Scope::Singleton),
            "prototype" => Ok(Scope::Prototype),
            "request" => Ok(Scope::Request),
            other => Err(DiError::UnsupportedScope(other.to_string())),
        }
    }
}
