// Driven adapter - account provisioning in the identity provider

pub mod keycloak;

pub use keycloak::{KeycloakIdentityProvider, KeycloakSettings};
