//! The component catalog.
//!
//! One module per component kind. Each kind is a concrete struct implementing
//! [`pushbox_core::component::Component`], constructed from its config struct
//! by the factory registry and cloned from templates at placement time.

pub mod animated_sprite;
pub mod movement;
pub mod sokoban;
pub mod spawn;
pub mod sprite;
pub mod text;
pub mod tile;
pub mod tile_map;

use pushbox_core::component::SharedComponent;
use pushbox_core::CoreError;

/// Borrow a shared component as a concrete kind, or fail with the kind name.
///
/// The `f` closure runs against the downcast reference so the borrow stays
/// scoped to this call.
pub(crate) fn with_concrete<T: 'static, R>(
    component: &SharedComponent,
    expected: &'static str,
    f: impl FnOnce(&T) -> R,
) -> Result<R, CoreError> {
    let guard = component.borrow();
    match guard.as_any().downcast_ref::<T>() {
        Some(concrete) => Ok(f(concrete)),
        None => Err(CoreError::ComponentKindMismatch {
            name: guard.name().to_owned(),
            expected,
        }),
    }
}
