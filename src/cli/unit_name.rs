//! # Unit Name Command
//!
//! Prints the deterministic execution unit name of a resource.

use movie_rating_controller::controller::reconciler::unit_name;
use movie_rating_controller::crd::ResourceKey;

pub fn unit_name_command(namespace: &str, name: &str) -> String {
    unit_name(&ResourceKey::new(namespace, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_library_naming() {
        assert_eq!(
            unit_name_command("media", "inception"),
            unit_name(&ResourceKey::new("media", "inception"))
        );
    }
}
