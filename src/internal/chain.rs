//! Resolution chain tracking for cycle detection.

use std::cell::RefCell;

use crate::config::ContainerConfig;
use crate::error::{DiError, DiResult};

// Thread-local resolution chain. Lookups made from inside user hooks run on
// the same thread, so they join the chain of the resolution that called them.
thread_local! {
    static RESOLUTION_CHAIN: RefCell<Vec<Link>> = const { RefCell::new(Vec::new()) };
}

/// One bean under construction, tagged with the container resolving it.
struct Link {
    owner: usize,
    id: String,
}

/// Guard for one active link in the thread-local resolution chain.
///
/// Entering records the bean as under construction; dropping the guard pops
/// it again, so beans reached twice through separate branches (diamonds) are
/// not reported as cycles.
pub(crate) struct ChainGuard {
    owner: usize,
}

impl ChainGuard {
    /// Enters `id` into the chain of the container identified by `owner`.
    ///
    /// Fails when `id` is already active more than `cycle_tolerance` times, or
    /// when the chain is already `max_depth` links deep.
    pub(crate) fn enter(owner: usize, id: &str, config: &ContainerConfig) -> DiResult<Self> {
        RESOLUTION_CHAIN.with(|chain| {
            let mut chain = chain.borrow_mut();
            let active: Vec<&str> = chain
                .iter()
                .filter(|link| link.owner == owner)
                .map(|link| link.id.as_str())
                .collect();

            // Depth guard
            if active.len() >= config.max_depth {
                return Err(DiError::DepthExceeded(config.max_depth));
            }

            let occurrences = active.iter().filter(|&&active_id| active_id == id).count();
            if occurrences > config.cycle_tolerance {
                let mut path: Vec<String> = active.iter().map(|s| s.to_string()).collect();
                path.push(id.to_string());
                return Err(DiError::Circular {
                    bean: id.to_string(),
                    path,
                });
            }

            chain.push(Link {
                owner,
                id: id.to_string(),
            });
            Ok(ChainGuard { owner })
        })
    }
}

impl Drop for ChainGuard {
    fn drop(&mut self) {
        RESOLUTION_CHAIN.with(|chain| {
            let mut chain = chain.borrow_mut();
            // Guards drop in reverse order of entry, so our link is the last
            // one belonging to this container
            if let Some(pos) = chain.iter().rposition(|link| link.owner == self.owner) {
                chain.remove(pos);
            }
        });
    }
}

/// Number of links the current thread holds for `owner`.
#[cfg(test)]
pub(crate) fn depth(owner: usize) -> usize {
    RESOLUTION_CHAIN.with(|chain| chain.borrow().iter().filter(|link| link.owner == owner).count())
}
