//! Change detection for reference-data updates.
//!
//! Diseases and medicines carry a fixed, ordered list of watched fields. A
//! field counts as changed iff the proposed value is present (non-empty) and
//! differs from the stored value; list-typed fields compare by deep value.
//! The changed-field names feed the notification message verbatim.

use crate::models::Disease;

/// Proposed disease update, watched fields only.
#[derive(Debug, Default)]
pub struct DiseaseUpdate<'a> {
    pub symptoms:        Option<&'a str>,
    pub treatment:       Option<&'a str>,
    pub severity:        Option<&'a str>,
    pub description:     Option<&'a str>,
    pub scientific_name: Option<&'a str>,
}

fn field_changed(proposed: Option<&str>, stored: Option<&str>) -> bool {
    match proposed {
        Some(value) if !value.trim().is_empty() => stored != Some(value),
        _ => false,
    }
}

/// Watched-field diff for a disease update, in the canonical watch order.
pub fn disease_changes(prior: &Disease, update: &DiseaseUpdate<'_>) -> Vec<&'static str> {
    let mut changes = Vec::new();
    if field_changed(update.symptoms, prior.symptoms.as_deref()) {
        changes.push("symptoms");
    }
    if field_changed(update.treatment, prior.treatment.as_deref()) {
        changes.push("treatment");
    }
    if field_changed(update.severity, prior.severity.as_deref()) {
        changes.push("severity");
    }
    if field_changed(update.description, prior.description.as_deref()) {
        changes.push("description");
    }
    if field_changed(update.scientific_name, prior.scientific_name.as_deref()) {
        changes.push("scientific_name");
    }
    changes
}

/// Proposed medicine update, watched fields only. `diseases` is the full
/// replacement set of linked disease ids (None means the links are untouched).
#[derive(Debug, Default)]
pub struct MedicineUpdate<'a> {
    pub description:        Option<&'a str>,
    pub usage_instructions: Option<&'a [String]>,
    pub diseases:           Option<&'a [String]>,
}

/// Watched-field diff for a medicine update. Linked-disease membership is
/// compared as a set.
pub fn medicine_changes(
    prior_description: Option<&str>,
    prior_instructions: &[String],
    prior_disease_ids: &[String],
    update: &MedicineUpdate<'_>,
) -> Vec<&'static str> {
    let mut changes = Vec::new();

    if field_changed(update.description, prior_description) {
        changes.push("description");
    }

    if let Some(proposed) = update.usage_instructions {
        if !proposed.is_empty() && proposed != prior_instructions {
            changes.push("usage_instructions");
        }
    }

    if let Some(proposed) = update.diseases {
        let mut new_set: Vec<&String> = proposed.iter().collect();
        let mut old_set: Vec<&String> = prior_disease_ids.iter().collect();
        new_set.sort();
        new_set.dedup();
        old_set.sort();
        old_set.dedup();
        if new_set != old_set {
            changes.push("diseases");
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn disease() -> Disease {
        let ts = NaiveDateTime::default();
        Disease {
            id:              "d1".into(),
            name:            "Tomato___Early_blight".into(),
            scientific_name: Some("Alternaria solani".into()),
            description:     Some("Fungal disease".into()),
            symptoms:        Some("Brown leaf spots".into()),
            severity:        Some("Moderate".into()),
            prevention:      Some("Crop rotation".into()),
            treatment:       Some("Mancozeb".into()),
            created_at:      ts,
            updated_at:      ts,
        }
    }

    #[test]
    fn identical_values_produce_no_changes() {
        let prior = disease();
        let update = DiseaseUpdate {
            symptoms:  Some("Brown leaf spots"),
            severity:  Some("Moderate"),
            treatment: Some("Mancozeb"),
            ..Default::default()
        };
        assert!(disease_changes(&prior, &update).is_empty());
    }

    #[test]
    fn single_field_change_is_reported_by_name() {
        let prior = disease();
        let update = DiseaseUpdate {
            severity: Some("Severe"),
            ..Default::default()
        };
        let changes = disease_changes(&prior, &update);
        assert_eq!(changes, vec!["severity"]);
        assert!(changes.join(", ").contains("severity"));
    }

    #[test]
    fn absent_and_empty_values_do_not_count() {
        let prior = disease();
        let update = DiseaseUpdate {
            symptoms:    None,
            description: Some("   "),
            ..Default::default()
        };
        assert!(disease_changes(&prior, &update).is_empty());
    }

    #[test]
    fn changes_follow_the_watch_order() {
        let prior = disease();
        let update = DiseaseUpdate {
            scientific_name: Some("A. solani sensu lato"),
            symptoms:        Some("Concentric rings"),
            severity:        Some("Severe"),
            ..Default::default()
        };
        assert_eq!(
            disease_changes(&prior, &update),
            vec!["symptoms", "severity", "scientific_name"]
        );
    }

    #[test]
    fn medicine_instructions_compare_deeply() {
        let prior = vec!["Mix 2 g per litre.".to_owned(), "Spray weekly.".to_owned()];
        let same = prior.clone();
        let update = MedicineUpdate {
            usage_instructions: Some(&same),
            ..Default::default()
        };
        assert!(medicine_changes(None, &prior, &[], &update).is_empty());

        let reordered = vec!["Spray weekly.".to_owned(), "Mix 2 g per litre.".to_owned()];
        let update = MedicineUpdate {
            usage_instructions: Some(&reordered),
            ..Default::default()
        };
        // ordered list: reordering counts as a change
        assert_eq!(medicine_changes(None, &prior, &[], &update), vec!["usage_instructions"]);
    }

    #[test]
    fn medicine_disease_links_compare_as_a_set() {
        let prior_ids = vec!["d1".to_owned(), "d2".to_owned()];

        let same_other_order = vec!["d2".to_owned(), "d1".to_owned()];
        let update = MedicineUpdate {
            diseases: Some(&same_other_order),
            ..Default::default()
        };
        assert!(medicine_changes(None, &[], &prior_ids, &update).is_empty());

        let grown = vec!["d1".to_owned(), "d2".to_owned(), "d3".to_owned()];
        let update = MedicineUpdate {
            diseases: Some(&grown),
            ..Default::default()
        };
        assert_eq!(medicine_changes(None, &[], &prior_ids, &update), vec!["diseases"]);
    }
}
