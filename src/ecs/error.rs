//! Errors reported by hierarchy mutations
//!
//! None of these abort: a rejected call leaves the tree exactly as it was.

use hecs::Entity;

/// A rejected hierarchy operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyError {
    /// The child is the parent itself or one of its ancestors
    CycleViolation {
        /// Node that would have received the child
        parent: Entity,
        /// Node that would have been attached
        child: Entity,
    },
    /// A node was asked to detach itself
    SelfDetach(Entity),
    /// The entity does not exist or carries no transform node
    MissingTransform(Entity),
    /// A keep-world re-parent needs the inverse of a singular world matrix
    SingularTransform(Entity),
}

impl std::fmt::Display for HierarchyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CycleViolation { parent, child } => {
                write!(f, "cannot attach {child:?} under its own descendant {parent:?}")
            }
            Self::SelfDetach(e) => write!(f, "{e:?} cannot detach itself"),
            Self::MissingTransform(e) => write!(f, "{e:?} has no transform node"),
            Self::SingularTransform(e) => write!(f, "world transform of {e:?} is not invertible"),
        }
    }
}

impl std::error::Error for HierarchyError {}
