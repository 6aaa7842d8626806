//! Shared building blocks for the site CMS crates: logging setup, startup
//! environment checks, pagination parameters and small response types.

pub mod types;
pub mod utils;
pub mod pagination;
pub mod env;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }
}
