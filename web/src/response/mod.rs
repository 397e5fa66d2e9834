//! Response bodies that are narrower than the stored models.

pub(crate) mod post;
pub(crate) mod user;
