// User-facing value objects shared by the team domain

pub mod value_objects;

pub use value_objects::Email;
