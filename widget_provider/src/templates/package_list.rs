use serde::Serialize;
use types::{PackageRecord, WidgetSize};

use super::verbs;

const MEDIUM_VISIBLE_LINES: usize = 6;
const LARGE_VISIBLE_LINES: usize = 14;

/// Number of package lines a widget of the given size can show. Small
/// widgets hide the list body entirely.
pub const fn visible_lines(size: WidgetSize) -> usize {
    match size {
        WidgetSize::Small => 0,
        WidgetSize::Medium => MEDIUM_VISIBLE_LINES,
        WidgetSize::Large => LARGE_VISIBLE_LINES,
    }
}

/// Build the text body of the updates list: one line per valid package, cut
/// off after as many lines as the widget size allows and followed by a
/// summary of what was left out.
pub fn format_package_lines(packages: &[PackageRecord], size: WidgetSize) -> String {
    let limit = visible_lines(size);
    if limit == 0 {
        return String::new();
    }

    let lines: Vec<String> = packages
        .iter()
        .filter(|package| package.valid)
        .map(|package| {
            format!(
                "{}: {} -> {}",
                package.name, package.version, package.new_version
            )
        })
        .collect();

    if lines.len() <= limit {
        return lines.join("\n");
    }

    let hidden = lines.len() - limit;
    let mut text = lines[..limit].join("\n");
    text.push('\n');
    text.push_str(&more_packages(hidden));
    text
}

fn more_packages(hidden: usize) -> String {
    format!("{hidden} more packages can also be upgraded")
}

/// A row of the package table in the updates template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRow {
    /// `updateindex<N>`, where N is the package's position in the list the
    /// rows were built from.
    pub verb: String,
    pub name: String,
    pub version: String,
    pub new_version: String,
    pub icon: String,
}

/// Rows for the valid packages a widget of the given size can show.
pub fn package_rows(packages: &[PackageRecord], size: WidgetSize) -> Vec<PackageRow> {
    packages
        .iter()
        .enumerate()
        .filter(|(_, package)| package.valid)
        .take(visible_lines(size))
        .map(|(index, package)| PackageRow {
            verb: format!("{}{index}", verbs::UPDATE_PACKAGE_PREFIX),
            name: package.name.clone(),
            version: package.version.clone(),
            new_version: package.new_version.clone(),
            icon: package.icon.clone(),
        })
        .collect()
}

/// Summary shown under the rows. Empty when every valid package has a row.
pub fn hidden_summary(packages: &[PackageRecord], size: WidgetSize) -> String {
    let limit = visible_lines(size);
    let valid = packages.iter().filter(|package| package.valid).count();

    if limit == 0 || valid <= limit {
        return String::new();
    }

    more_packages(valid - limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packages(count: usize) -> Vec<PackageRecord> {
        (0..count)
            .map(|i| {
                PackageRecord::from(
                    format!("Package {i}|Vendor.Package{i}|1.{i}|2.{i}|winget|Winget")
                        .as_str(),
                )
            })
            .collect()
    }

    #[test]
    fn test_medium_truncates_after_six_lines() {
        let text = format_package_lines(&packages(7), WidgetSize::Medium);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "Package 0: 1.0 -> 2.0");
        assert_eq!(lines[5], "Package 5: 1.5 -> 2.5");
        assert_eq!(lines[6], "1 more packages can also be upgraded");
    }

    #[test]
    fn test_large_truncates_after_fourteen_lines() {
        let text = format_package_lines(&packages(15), WidgetSize::Large);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 15);
        assert_eq!(lines[13], "Package 13: 1.13 -> 2.13");
        assert_eq!(lines[14], "1 more packages can also be upgraded");
    }

    #[test]
    fn test_no_summary_when_everything_fits() {
        let text = format_package_lines(&packages(6), WidgetSize::Medium);

        assert_eq!(text.lines().count(), 6);
        assert!(!text.contains("more packages"));

        let text = format_package_lines(&packages(7), WidgetSize::Large);
        assert_eq!(text.lines().count(), 7);
    }

    #[test]
    fn test_small_has_no_body() {
        assert_eq!(format_package_lines(&packages(3), WidgetSize::Small), "");
    }

    #[test]
    fn test_invalid_packages_are_not_listed() {
        let mut list = packages(2);
        list.insert(1, PackageRecord::from("broken"));

        let text = format_package_lines(&list, WidgetSize::Medium);

        assert_eq!(text, "Package 0: 1.0 -> 2.0\nPackage 1: 1.1 -> 2.1");
    }

    #[test]
    fn test_summary_counts_every_hidden_package() {
        let text = format_package_lines(&packages(20), WidgetSize::Medium);

        assert!(text.ends_with("\n14 more packages can also be upgraded"));
    }

    #[test]
    fn test_rows_carry_icon_and_update_verb() {
        let mut list = packages(2);
        list[1].icon = "https://example.com/icon.png".to_string();

        let rows = package_rows(&list, WidgetSize::Medium);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].verb, "updateindex0");
        assert_eq!(rows[0].icon, types::DEFAULT_PACKAGE_ICON);
        assert_eq!(rows[1].verb, "updateindex1");
        assert_eq!(rows[1].name, "Package 1");
        assert_eq!(rows[1].new_version, "2.1");
        assert_eq!(rows[1].icon, "https://example.com/icon.png");
    }

    #[test]
    fn test_rows_follow_widget_size() {
        assert_eq!(package_rows(&packages(20), WidgetSize::Medium).len(), 6);
        assert_eq!(package_rows(&packages(20), WidgetSize::Large).len(), 14);
        assert!(package_rows(&packages(20), WidgetSize::Small).is_empty());
    }

    #[test]
    fn test_row_verbs_skip_invalid_positions() {
        let mut list = packages(2);
        list.insert(0, PackageRecord::from("broken"));

        let verbs: Vec<String> = package_rows(&list, WidgetSize::Large)
            .into_iter()
            .map(|row| row.verb)
            .collect();

        assert_eq!(verbs, ["updateindex1", "updateindex2"]);
    }

    #[test]
    fn test_hidden_summary() {
        assert_eq!(
            hidden_summary(&packages(8), WidgetSize::Medium),
            "2 more packages can also be upgraded"
        );
        assert_eq!(hidden_summary(&packages(6), WidgetSize::Medium), "");
        assert_eq!(hidden_summary(&packages(8), WidgetSize::Small), "");
    }

    #[test]
    fn test_row_serializes_for_template() {
        let row = &package_rows(&packages(1), WidgetSize::Medium)[0];

        let value = serde_json::to_value(row).unwrap();

        assert_eq!(value["newVersion"], "2.0");
        assert_eq!(value["verb"], "updateindex0");
    }
}
