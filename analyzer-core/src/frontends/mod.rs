// Dashboard assets compiled into the binary.
pub mod provider_embed;
