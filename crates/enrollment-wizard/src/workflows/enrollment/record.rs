use super::domain::{FormRecord, PartialFormRecord};

/// Owns the single record the wizard accumulates across steps.
#[derive(Debug, Clone, Default)]
pub struct FormRecordStore {
    record: FormRecord,
}

impl FormRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> &FormRecord {
        &self.record
    }

    pub fn snapshot(&self) -> FormRecord {
        self.record.clone()
    }

    /// Shallow merge: keys present in `partial` overwrite, every other field is kept.
    ///
    /// A change of program category clears `course` in the same update; a `course` carried
    /// by the same partial is applied after the clear.
    pub fn merge(&mut self, partial: PartialFormRecord) -> &FormRecord {
        let mut next = self.record.clone();

        let PartialFormRecord {
            first_name,
            last_name,
            email,
            phone_number,
            address,
            state,
            program_category,
            course,
            preferred_location,
            training_method,
            gender,
            date_of_birth,
            marital_status,
            notes,
        } = partial;

        if let Some(category) = program_category {
            if category != next.program_category {
                next.course.clear();
            }
            next.program_category = category;
        }

        overwrite(&mut next.first_name, first_name);
        overwrite(&mut next.last_name, last_name);
        overwrite(&mut next.email, email);
        overwrite(&mut next.phone_number, phone_number);
        overwrite(&mut next.address, address);
        overwrite(&mut next.state, state);
        overwrite(&mut next.course, course);
        overwrite(&mut next.date_of_birth, date_of_birth);
        overwrite(&mut next.notes, notes);

        if preferred_location.is_some() {
            next.preferred_location = preferred_location;
        }
        if training_method.is_some() {
            next.training_method = training_method;
        }
        if gender.is_some() {
            next.gender = gender;
        }
        if marital_status.is_some() {
            next.marital_status = marital_status;
        }

        self.record = next;
        &self.record
    }

    pub fn clear(&mut self) {
        self.record = FormRecord::default();
    }
}

fn overwrite<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::enrollment::domain::{Gender, MaritalStatus};
    use std::collections::BTreeSet;

    fn courses(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn merge_keeps_fields_absent_from_partial() {
        let mut store = FormRecordStore::new();
        store.merge(PartialFormRecord {
            first_name: Some("Ada".to_string()),
            email: Some("ada@x.com".to_string()),
            ..PartialFormRecord::default()
        });
        store.merge(PartialFormRecord {
            gender: Some(Gender::Female),
            ..PartialFormRecord::default()
        });
        let record = store.merge(PartialFormRecord {
            marital_status: Some(MaritalStatus::Married),
            notes: Some("Career change".to_string()),
            ..PartialFormRecord::default()
        });

        assert_eq!(record.first_name, "Ada");
        assert_eq!(record.email, "ada@x.com");
        assert_eq!(record.gender, Some(Gender::Female));
        assert_eq!(record.marital_status, Some(MaritalStatus::Married));
    }

    #[test]
    fn empty_partial_is_a_no_op() {
        let mut store = FormRecordStore::new();
        store.merge(PartialFormRecord {
            last_name: Some("Lovelace".to_string()),
            program_category: Some("AWS".to_string()),
            course: Some(courses(&["DevOps Engineering"])),
            ..PartialFormRecord::default()
        });
        let before = store.snapshot();
        store.merge(PartialFormRecord::default());
        assert_eq!(store.record(), &before);
    }

    #[test]
    fn category_change_clears_courses() {
        let mut store = FormRecordStore::new();
        store.merge(PartialFormRecord {
            program_category: Some("AWS".to_string()),
            course: Some(courses(&["DevOps Engineering", "I'll decide later"])),
            ..PartialFormRecord::default()
        });

        let record = store.merge(PartialFormRecord {
            program_category: Some("Data Science".to_string()),
            ..PartialFormRecord::default()
        });

        assert_eq!(record.program_category, "Data Science");
        assert!(record.course.is_empty());
    }

    #[test]
    fn reselecting_same_category_keeps_courses() {
        let mut store = FormRecordStore::new();
        store.merge(PartialFormRecord {
            program_category: Some("AWS".to_string()),
            course: Some(courses(&["DevOps Engineering"])),
            ..PartialFormRecord::default()
        });

        let record = store.merge(PartialFormRecord {
            program_category: Some("AWS".to_string()),
            ..PartialFormRecord::default()
        });

        assert_eq!(record.course, courses(&["DevOps Engineering"]));
    }

    #[test]
    fn courses_sent_with_new_category_survive_the_clear() {
        let mut store = FormRecordStore::new();
        store.merge(PartialFormRecord {
            program_category: Some("AWS".to_string()),
            course: Some(courses(&["DevOps Engineering"])),
            ..PartialFormRecord::default()
        });

        let record = store.merge(PartialFormRecord {
            program_category: Some("Data Science".to_string()),
            course: Some(courses(&["Data Analytics"])),
            ..PartialFormRecord::default()
        });

        assert_eq!(record.course, courses(&["Data Analytics"]));
    }
}
