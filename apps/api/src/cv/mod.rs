// CV record store: the only owner of CV documents.
// Handlers validate input, the store applies CRUD, backends hold the slot.

pub mod backend;
pub mod handlers;
pub mod ids;
pub mod patch;
pub mod store;
pub mod validation;
