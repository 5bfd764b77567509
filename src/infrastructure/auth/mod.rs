mod static_token_verifier;
mod supabase_verifier;
mod verifier_factory;

pub use static_token_verifier::StaticTokenVerifier;
pub use supabase_verifier::SupabaseVerifier;
pub use verifier_factory::create_identity_verifier;
