//! Clientes HTTP para servicios externos

pub mod firebase_client;

pub use firebase_client::FirebaseClient;
