use crate::forum::FlairTemplate;

pub const OTHER_LABEL: &str = "<other>";

pub fn default_labels() -> Vec<String> {
    ["Blender", "Unity", "Modo", "3DS Max", "Cinema 4D", "Maya", OTHER_LABEL]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Link flair text marking an entry for the given month.
///
/// The doubled backslash renders as a single one in forum markdown.
pub fn submission_label(label: &str, month_name: &str, year: i32) -> String {
    format!("{label} \\\\ {month_name} {year} SUBMISSION")
}

/// Plain labels followed by this month's submission labels.
pub fn templates(labels: &[String], month_name: &str, year: i32) -> Vec<FlairTemplate> {
    labels
        .iter()
        .cloned()
        .chain(
            labels
                .iter()
                .map(|label| submission_label(label, month_name, year)),
        )
        .map(|text| {
            if text.starts_with(OTHER_LABEL) {
                FlairTemplate {
                    text,
                    css_class: String::new(),
                    text_editable: true,
                }
            } else {
                let css_class = text
                    .split(' ')
                    .next()
                    .unwrap_or_default()
                    .to_lowercase();
                FlairTemplate {
                    text,
                    css_class,
                    text_editable: false,
                }
            }
        })
        .collect()
}
