//! Injection slots and the injection points that fill them.
//!
//! A bean exposes each dependency as a write-once slot. The container fills the
//! slot after the bean is constructed, which is what lets singletons refer to
//! each other (including themselves) without any construction-order puzzle.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::bean_type::BeanType;
use crate::instance::{AnyArc, Instance};
use crate::traits::Bean;

/// Slot for a single injected reference.
///
/// Empty until the container wires the owning bean, and left empty when an
/// optional dependency is missing.
pub struct Inject<E: ?Sized> {
    cell: OnceCell<Arc<E>>,
}

impl<E: ?Sized> Inject<E> {
    /// The injected reference, if any.
    pub fn get(&self) -> Option<&Arc<E>> {
        self.cell.get()
    }

    /// Whether the slot has been filled.
    pub fn is_set(&self) -> bool {
        self.cell.get().is_some()
    }

    fn fill(&self, value: Arc<E>) {
        // Wiring happens once per bean; a refill would be a no-op
        let _ = self.cell.set(value);
    }
}

impl<E: ?Sized> Default for Inject<E> {
    fn default() -> Self {
        Self { cell: OnceCell::new() }
    }
}

impl<E: ?Sized> fmt::Debug for Inject<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("type", &std::any::type_name::<E>())
            .field("set", &self.is_set())
            .finish()
    }
}

/// Slot for every bean providing `E`, in bean id order.
pub struct InjectList<E: ?Sized> {
    cell: OnceCell<Vec<Arc<E>>>,
}

impl<E: ?Sized> InjectList<E> {
    /// The injected references. `None` when the slot was never filled.
    pub fn get(&self) -> Option<&[Arc<E>]> {
        self.cell.get().map(Vec::as_slice)
    }

    /// Injected references, empty when the slot was never filled.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<E>> {
        self.cell.get().into_iter().flatten()
    }

    /// Number of injected references.
    pub fn len(&self) -> usize {
        self.cell.get().map_or(0, Vec::len)
    }

    /// Whether no reference was injected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fill(&self, values: Vec<Arc<E>>) {
        let _ = self.cell.set(values);
    }
}

impl<E: ?Sized> Default for InjectList<E> {
    fn default() -> Self {
        Self { cell: OnceCell::new() }
    }
}

impl<E: ?Sized> fmt::Debug for InjectList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectList")
            .field("type", &std::any::type_name::<E>())
            .field("len", &self.len())
            .finish()
    }
}

/// Slot for every bean providing `E`, keyed by bean id.
pub struct InjectMap<E: ?Sized> {
    cell: OnceCell<HashMap<String, Arc<E>>>,
}

impl<E: ?Sized> InjectMap<E> {
    /// The injected map. `None` when the slot was never filled.
    pub fn get(&self) -> Option<&HashMap<String, Arc<E>>> {
        self.cell.get()
    }

    /// The reference injected under a bean id.
    pub fn bean(&self, id: &str) -> Option<&Arc<E>> {
        self.cell.get().and_then(|map| map.get(id))
    }

    /// Number of injected references.
    pub fn len(&self) -> usize {
        self.cell.get().map_or(0, HashMap::len)
    }

    /// Whether no reference was injected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fill(&self, values: HashMap<String, Arc<E>>) {
        let _ = self.cell.set(values);
    }
}

impl<E: ?Sized> Default for InjectMap<E> {
    fn default() -> Self {
        Self { cell: OnceCell::new() }
    }
}

impl<E: ?Sized> fmt::Debug for InjectMap<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectMap")
            .field("type", &std::any::type_name::<E>())
            .field("keys", &self.cell.get().map(|m| m.keys().collect::<Vec<_>>()))
            .finish()
    }
}

/// Shape of an injection target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionKind {
    /// One reference
    Single,
    /// All providers of the element type, ordered by bean id
    List,
    /// All providers of the element type, keyed by bean id
    Map,
}

/// Writes resolved dependencies into the owner's slot.
///
/// Fails with the id of the first dependency that does not provide the
/// element type.
pub(crate) type Assign = Arc<dyn Fn(&AnyArc, Vec<(String, Instance)>) -> Result<(), String> + Send + Sync>;

/// One injectable field of a bean type.
#[derive(Clone)]
pub(crate) struct InjectionPoint {
    pub(crate) field: &'static str,
    pub(crate) target: Option<String>,
    pub(crate) optional: bool,
    pub(crate) kind: InjectionKind,
    pub(crate) element: BeanType,
    pub(crate) assign: Assign,
}

impl InjectionPoint {
    pub(crate) fn single<T, E>(field: &'static str, slot: fn(&T) -> &Inject<E>) -> Self
    where
        T: Bean,
        E: ?Sized + 'static,
    {
        let assign: Assign = Arc::new(move |owner: &AnyArc, mut resolved: Vec<(String, Instance)>| {
            let Some(owner) = owner.downcast_ref::<T>() else {
                return Ok(());
            };
            // Single targets resolve to exactly one dependency or none
            if let Some((id, instance)) = resolved.pop() {
                let value = instance.cast::<E>().ok_or(id)?;
                slot(owner).fill(value);
            }
            Ok(())
        });
        Self::new::<E>(field, InjectionKind::Single, assign)
    }

    pub(crate) fn list<T, E>(field: &'static str, slot: fn(&T) -> &InjectList<E>) -> Self
    where
        T: Bean,
        E: ?Sized + 'static,
    {
        let assign: Assign = Arc::new(move |owner: &AnyArc, resolved: Vec<(String, Instance)>| {
            let Some(owner) = owner.downcast_ref::<T>() else {
                return Ok(());
            };
            let values = resolved
                .into_iter()
                .map(|(id, instance)| instance.cast::<E>().ok_or(id))
                .collect::<Result<Vec<_>, _>>()?;
            slot(owner).fill(values);
            Ok(())
        });
        Self::new::<E>(field, InjectionKind::List, assign)
    }

    pub(crate) fn map<T, E>(field: &'static str, slot: fn(&T) -> &InjectMap<E>) -> Self
    where
        T: Bean,
        E: ?Sized + 'static,
    {
        let assign: Assign = Arc::new(move |owner: &AnyArc, resolved: Vec<(String, Instance)>| {
            let Some(owner) = owner.downcast_ref::<T>() else {
                return Ok(());
            };
            let mut values = HashMap::with_capacity(resolved.len());
            for (id, instance) in resolved {
                match instance.cast::<E>() {
                    Some(value) => {
                        values.insert(id, value);
                    }
                    None => return Err(id),
                }
            }
            slot(owner).fill(values);
            Ok(())
        });
        Self::new::<E>(field, InjectionKind::Map, assign)
    }

    fn new<E: ?Sized + 'static>(field: &'static str, kind: InjectionKind, assign: Assign) -> Self {
        Self {
            field,
            target: None,
            optional: false,
            kind,
            element: BeanType::of::<E>(),
            assign,
        }
    }
}

impl fmt::Debug for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionPoint")
            .field("field", &self.field)
            .field("target", &self.target)
            .field("optional", &self.optional)
            .field("kind", &self.kind)
            .field("element", &self.element.name())
            .finish()
    }
}

/// Parses an optional flag literal.
///
/// Accepts `1`, `t`, `T`, `TRUE`, `true`, `True` and their false
/// counterparts `0`, `f`, `F`, `FALSE`, `false`, `False`.
pub(crate) fn parse_flag(literal: &str) -> Option<bool> {
    match literal {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
