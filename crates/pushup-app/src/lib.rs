// Application layer - wires domain logic to the chat platform

pub mod application;
pub mod presentation;
