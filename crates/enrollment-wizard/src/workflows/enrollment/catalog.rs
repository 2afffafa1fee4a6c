use serde::Serialize;

/// A program category and the courses an applicant may pick under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramOffering {
    pub category: &'static str,
    pub sub_options: &'static [&'static str],
}

pub const UNDECIDED_COURSE: &str = "I'll decide later";

pub const PROGRAM_CATALOG: &[ProgramOffering] = &[
    ProgramOffering {
        category: "AWS",
        sub_options: &[
            "AWS Cloud Engineering/Solutions Architect",
            "DevOps Engineering",
            UNDECIDED_COURSE,
        ],
    },
    ProgramOffering {
        category: "Data Science",
        sub_options: &[
            "Data Analytics",
            "Machine Learning Engineering",
            UNDECIDED_COURSE,
        ],
    },
    ProgramOffering {
        category: "Software Engineering",
        sub_options: &[
            "Full Stack Development",
            "React JS Development",
            UNDECIDED_COURSE,
        ],
    },
    ProgramOffering {
        category: "Cybersecurity",
        sub_options: &["Security Operations", "Cloud Security", UNDECIDED_COURSE],
    },
    ProgramOffering {
        category: "Salesforce",
        sub_options: &[],
    },
];

pub fn offering(category: &str) -> Option<&'static ProgramOffering> {
    PROGRAM_CATALOG
        .iter()
        .find(|offering| offering.category == category)
}

/// Courses offered under `category`; unknown categories offer none.
pub fn sub_options_for(category: &str) -> &'static [&'static str] {
    offering(category)
        .map(|offering| offering.sub_options)
        .unwrap_or(&[])
}

pub fn is_offered(category: &str, course: &str) -> bool {
    sub_options_for(category).contains(&course)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aws_offers_cloud_and_devops_tracks() {
        assert_eq!(
            sub_options_for("AWS"),
            [
                "AWS Cloud Engineering/Solutions Architect",
                "DevOps Engineering",
                "I'll decide later"
            ]
        );
    }

    #[test]
    fn unknown_and_flat_categories_offer_nothing() {
        assert!(sub_options_for("Underwater Basket Weaving").is_empty());
        assert!(sub_options_for("Salesforce").is_empty());
        assert!(!is_offered("Data Science", "DevOps Engineering"));
    }
}
