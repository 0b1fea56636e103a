mod aggregate;
mod roster;
mod value_objects;

#[cfg(test)]
mod aggregate_test;

pub use aggregate::UserRecord;
pub use roster::UserRoster;
pub use value_objects::ActivityStatus;
