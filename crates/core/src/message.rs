//! User-facing notification texts (French).

use serde::{Deserialize, Serialize};

use crate::availability::SlotRecord;

/// Title used for push notifications and as the email subject prefix.
pub const NOTIFICATION_TITLE: &str = "Vaccin Check";

/// One-line summary of a record, singular or plural depending on the count.
pub fn availability_text(record: &SlotRecord) -> String {
    if record.available > 1 {
        format!(
            "{} doses sont disponibles le {} à {}",
            record.available, record.when, record.name
        )
    } else {
        format!(
            "{} dose est disponible le {} à {}",
            record.available, record.when, record.name
        )
    }
}

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

/// Render the email sent to one profile: one paragraph per record.
pub fn email_content(profile_name: &str, records: &[SlotRecord]) -> EmailContent {
    let subject = format!(
        "{NOTIFICATION_TITLE}: {} centre(s) disponible(s)",
        records.len()
    );

    let mut body = format!("Bonjour {profile_name},\n\n");
    for record in records {
        body.push_str(&availability_text(record));
        body.push_str(".\nRéservez ici : ");
        body.push_str(&record.url);
        body.push_str("\n\n");
    }
    body.push_str("-- \n");
    body.push_str(NOTIFICATION_TITLE);
    body.push('\n');

    EmailContent { subject, body }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(available: usize) -> SlotRecord {
        SlotRecord {
            center: "a".into(),
            name: "Centre A".into(),
            url: "https://partners.doctolib.fr/centre-de-sante/x/a".into(),
            available,
            when: "2021-06-01".into(),
        }
    }

    #[test]
    fn singular_phrasing() {
        assert_eq!(
            availability_text(&record(1)),
            "1 dose est disponible le 2021-06-01 à Centre A"
        );
    }

    #[test]
    fn plural_phrasing() {
        assert_eq!(
            availability_text(&record(7)),
            "7 doses sont disponibles le 2021-06-01 à Centre A"
        );
    }

    #[test]
    fn email_has_one_paragraph_per_record() {
        let mut second = record(3);
        second.name = "Centre B".into();
        let email = email_content("Alice", &[record(1), second]);

        assert_eq!(email.subject, "Vaccin Check: 2 centre(s) disponible(s)");
        assert!(email.body.starts_with("Bonjour Alice,"));
        assert!(email.body.contains("1 dose est disponible le 2021-06-01 à Centre A"));
        assert!(email.body.contains("3 doses sont disponibles le 2021-06-01 à Centre B"));
        assert_eq!(email.body.matches("Réservez ici").count(), 2);
    }
}
