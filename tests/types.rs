// ABOUTME: Integration tests for image names and identifiers.
// ABOUTME: Tests parsing, tag classification, and containment.

use tagpull::types::*;

mod image_name_tests {
    use super::*;

    #[test]
    fn parse_simple_name() {
        let img = ImageName::parse("nginx").unwrap();
        assert_eq!(img.name(), "nginx");
        assert_eq!(img.tag(), LATEST);
        assert!(img.registry().is_none());
        assert_eq!(img.constraint(), &TagConstraint::Exact);
    }

    #[test]
    fn parse_with_registry_and_org() {
        let img = ImageName::parse("ghcr.io/org/repo:v1.2.3").unwrap();
        assert_eq!(img.registry(), Some("ghcr.io"));
        assert_eq!(img.name(), "org/repo");
        assert_eq!(img.tag(), "v1.2.3");
        assert_eq!(img.name_with_registry(), "ghcr.io/org/repo");
    }

    #[test]
    fn registry_port_is_not_a_tag() {
        let img = ImageName::parse("localhost:5000/app").unwrap();
        assert_eq!(img.registry(), Some("localhost:5000"));
        assert_eq!(img.name(), "app");
        assert_eq!(img.tag(), LATEST);

        let tagged = ImageName::parse("localhost:5000/app:1.2").unwrap();
        assert_eq!(tagged.tag(), "1.2");
    }

    #[test]
    fn tilde_wildcard_is_a_range() {
        let img = ImageName::parse("nginx:~1.x").unwrap();
        assert!(img.has_version_range());
        assert!(img.needs_resolution());
        assert!(!img.has_version());
    }

    #[test]
    fn comparator_list_is_a_range() {
        let img = ImageName::parse("app:>=1.2 <2").unwrap();
        assert!(img.has_version_range());
    }

    #[test]
    fn star_is_all() {
        let img = ImageName::parse("redis:*").unwrap();
        assert!(img.is_all());
        assert!(img.needs_resolution());
        assert!(!img.has_version_range());
    }

    #[test]
    fn versions_and_words_are_exact() {
        for tag in ["1.2.3", "v2", "1.2", "latest", "alpine", "3.18-slim"] {
            let img = ImageName::parse(&format!("app:{}", tag)).unwrap();
            assert_eq!(img.constraint(), &TagConstraint::Exact, "tag {tag}");
            assert!(!img.needs_resolution());
        }
    }

    #[test]
    fn exact_versions_are_padded() {
        let img = ImageName::parse("app:v2.1").unwrap();
        assert_eq!(img.tag_as_version(), Some(semver::Version::new(2, 1, 0)));
        assert!(img.has_version());
    }

    #[test]
    fn parse_empty_returns_error() {
        assert!(matches!(
            ImageName::parse("  "),
            Err(ParseImageNameError::Empty)
        ));
    }

    #[test]
    fn empty_tag_is_rejected() {
        assert!(matches!(
            ImageName::parse("nginx:"),
            Err(ParseImageNameError::InvalidFormat(_))
        ));
    }

    #[test]
    fn digests_are_rejected() {
        assert!(matches!(
            ImageName::parse("nginx@sha256:abc"),
            Err(ParseImageNameError::InvalidChar('@'))
        ));
    }

    #[test]
    fn unparsable_range_is_a_literal_tag() {
        let name = ImageName::parse("app:~banana").unwrap();
        assert_eq!(name.constraint(), &TagConstraint::Exact);
        assert_eq!(name.tag(), "~banana");
    }

    #[test]
    fn x_components_without_a_numeric_major_are_literal() {
        for tag in ["release.x", "build-2.x", "x", "X"] {
            let name = ImageName::parse(&format!("app:{}", tag)).unwrap();
            assert_eq!(name.constraint(), &TagConstraint::Exact, "tag {}", tag);
            assert!(!name.needs_resolution());
            assert_eq!(name.tag(), tag);
        }
    }

    #[test]
    fn x_components_after_a_numeric_major_are_ranges() {
        assert!(ImageName::parse("app:1.x").unwrap().has_version_range());
        assert!(ImageName::parse("app:v2.3.x").unwrap().has_version_range());
    }

    #[test]
    fn display_round_trips() {
        for input in ["ghcr.io/org/app:~1.x", "nginx:latest", "localhost:5000/app:1.2"] {
            assert_eq!(ImageName::parse(input).unwrap().to_string(), input);
        }
    }

    #[test]
    fn with_tag_builds_exact_name_of_same_repository() {
        let ranged = ImageName::parse("ghcr.io/org/app:^2").unwrap();
        let concrete = ranged.with_tag("2.4.0");
        assert_eq!(concrete.to_string(), "ghcr.io/org/app:2.4.0");
        assert!(!concrete.needs_resolution());
        assert!(ranged.has_version_range());
    }
}

mod containment_tests {
    use super::*;

    fn name(s: &str) -> ImageName {
        ImageName::parse(s).unwrap()
    }

    #[test]
    fn range_contains_versions_inside_it() {
        let range = name("nginx:~1.x");
        assert!(range.contains(&name("nginx:1.4.0")));
        assert!(range.contains(&name("nginx:v1.25")));
        assert!(!range.contains(&name("nginx:2.0.0")));
        assert!(!range.contains(&name("nginx:0.9.9")));
    }

    #[test]
    fn range_contains_latest_but_not_words() {
        let range = name("nginx:~1.x");
        assert!(range.contains(&name("nginx:latest")));
        assert!(!range.contains(&name("nginx:alpine")));
    }

    #[test]
    fn all_contains_every_tag_of_its_repository() {
        let all = name("redis:*");
        assert!(all.contains(&name("redis:7.2")));
        assert!(all.contains(&name("redis:alpine")));
        assert!(!all.contains(&name("valkey:7.2")));
    }

    #[test]
    fn exact_contains_only_the_same_tag() {
        let exact = name("app:1.2");
        assert!(exact.contains(&name("app:1.2")));
        assert!(!exact.contains(&name("app:1.2.0")));
    }

    #[test]
    fn docker_hub_aliases_are_the_same_repository() {
        let all = name("nginx:*");
        assert!(all.contains(&name("docker.io/library/nginx:1.0.0")));
        assert!(all.contains(&name("index.docker.io/nginx:1.0.0")));
        assert!(!all.contains(&name("ghcr.io/nginx:1.0.0")));
    }

    #[test]
    fn registries_must_match() {
        let all = name("ghcr.io/org/app:*");
        assert!(all.contains(&name("ghcr.io/org/app:1.0.0")));
        assert!(!all.contains(&name("org/app:1.0.0")));
    }

    #[test]
    fn wildcard_contains_literal_x_tags() {
        let all = name("app:*");
        assert!(all.contains(&ImageName::parse_concrete("app:release.x").unwrap()));
        assert!(all.contains(&ImageName::parse_concrete("app:x").unwrap()));
        assert!(!name("app:~1.x").contains(&name("app:release.x")));
    }

    #[test]
    fn concrete_parse_never_yields_a_range() {
        let listed = ImageName::parse_concrete("app:*").unwrap();
        assert_eq!(listed.constraint(), &TagConstraint::Exact);
        assert!(!name("app:~1.x").contains(&listed));
    }
}

mod id_tests {
    use super::*;

    #[test]
    fn short_truncates_to_twelve_characters() {
        let id = ContainerId::new("0123456789abcdef0123");
        assert_eq!(id.short(), "0123456789ab");
        assert_eq!(id.as_str(), "0123456789abcdef0123");
    }

    #[test]
    fn short_keeps_short_ids() {
        assert_eq!(ImageId::new("abc").short(), "abc");
    }
}
