use std::sync::Arc;

use crate::application::ports::IdentityVerifier;
use crate::presentation::config::{AuthProvider, AuthSettings};

use super::{StaticTokenVerifier, SupabaseVerifier};

pub fn create_identity_verifier(settings: &AuthSettings) -> Arc<dyn IdentityVerifier> {
    match settings.provider {
        AuthProvider::Supabase => {
            if settings.supabase_url.is_empty() || settings.supabase_anon_key.is_empty() {
                tracing::warn!("Supabase credentials not configured; every request will be rejected");
            }
            Arc::new(SupabaseVerifier::new(
                settings.supabase_url.clone(),
                settings.supabase_anon_key.clone(),
            ))
        }
        AuthProvider::Static => {
            tracing::info!(
                tokens = settings.static_tokens.len(),
                "Using static token identity verifier"
            );
            Arc::new(StaticTokenVerifier::new(settings.static_tokens.clone()))
        }
    }
}
