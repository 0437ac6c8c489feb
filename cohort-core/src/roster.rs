use cohort_model::{Contact, ContactRole};
use serde::{Deserialize, Serialize};

/// Knobs for the classification step.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct RosterOptions {
    /// When no regular contacts were classified, the entire input list is
    /// batched as regular. Whether the elevated set survives that fallback
    /// is an explicit switch: `true` folds elevated contacts into the
    /// regular pool and clears the elevated set, `false` keeps the elevated
    /// set as classified.
    #[serde(default)]
    pub merge_elevated_into_regular_on_empty_fallback: bool,
}

/// Input contact list split into the two scheduling roles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roster {
    pub regular: Vec<Contact>,
    pub elevated: Vec<Contact>,
}

impl Roster {
    /// Splits `contacts` into regular and elevated sequences, preserving
    /// relative input order within each.
    ///
    /// Contacts carrying an unrecognized role are coerced to regular with a
    /// warning; they are never dropped.
    pub fn classify(contacts: Vec<Contact>, options: RosterOptions) -> Self {
        let mut regular = Vec::new();
        let mut elevated = Vec::new();

        for contact in &contacts {
            match contact.role {
                ContactRole::Regular => regular.push(contact.clone()),
                ContactRole::Elevated => elevated.push(contact.clone()),
                ContactRole::Unrecognized => {
                    tracing::warn!(
                        target: "cohort::roster",
                        identifier = %contact.identifier,
                        "unrecognized contact role, treating as regular"
                    );
                    regular.push(contact.clone());
                }
            }
        }

        if regular.is_empty() && !contacts.is_empty() {
            tracing::warn!(
                target: "cohort::roster",
                total = contacts.len(),
                merge_elevated = options.merge_elevated_into_regular_on_empty_fallback,
                "no regular contacts classified, batching the entire list as regular"
            );
            regular = contacts;
            if options.merge_elevated_into_regular_on_empty_fallback {
                elevated.clear();
            }
        }

        Self { regular, elevated }
    }

    pub fn is_empty(&self) -> bool {
        self.regular.is_empty() && self.elevated.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: &str, role: ContactRole) -> Contact {
        Contact::new(None, id, role).unwrap()
    }

    #[test]
    fn classify_preserves_relative_order() {
        let contacts = vec![
            contact("1", ContactRole::Regular),
            contact("2", ContactRole::Elevated),
            contact("3", ContactRole::Regular),
            contact("4", ContactRole::Elevated),
            contact("5", ContactRole::Regular),
        ];
        let roster = Roster::classify(contacts, RosterOptions::default());

        let regular_ids: Vec<_> = roster.regular.iter().map(|c| c.identifier.as_str()).collect();
        let elevated_ids: Vec<_> = roster.elevated.iter().map(|c| c.identifier.as_str()).collect();
        assert_eq!(regular_ids, ["1", "3", "5"]);
        assert_eq!(elevated_ids, ["2", "4"]);
    }

    #[test]
    fn unrecognized_role_is_coerced_to_regular() {
        let contacts = vec![
            contact("1", ContactRole::Unrecognized),
            contact("2", ContactRole::Regular),
        ];
        let roster = Roster::classify(contacts, RosterOptions::default());
        assert_eq!(roster.regular.len(), 2);
        assert!(roster.elevated.is_empty());
    }

    #[test]
    fn empty_regular_fallback_batches_entire_input() {
        let contacts = vec![
            contact("1", ContactRole::Elevated),
            contact("2", ContactRole::Elevated),
        ];
        let roster = Roster::classify(contacts.clone(), RosterOptions::default());

        // The whole input becomes the regular pool, order intact.
        assert_eq!(roster.regular, contacts);
        // Elevated set survives by default.
        assert_eq!(roster.elevated.len(), 2);
    }

    #[test]
    fn fallback_merge_flag_clears_elevated() {
        let contacts = vec![contact("1", ContactRole::Elevated)];
        let roster = Roster::classify(
            contacts.clone(),
            RosterOptions {
                merge_elevated_into_regular_on_empty_fallback: true,
            },
        );
        assert_eq!(roster.regular, contacts);
        assert!(roster.elevated.is_empty());
    }

    #[test]
    fn empty_input_yields_empty_roster() {
        let roster = Roster::classify(Vec::new(), RosterOptions::default());
        assert!(roster.is_empty());
    }
}
