//! Channel controller: current room, known rooms, and the chat-slot consumer.

mod consumer;
mod controller;

pub use controller::ChannelController;
