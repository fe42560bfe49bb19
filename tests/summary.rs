use encoding_rs::UTF_8;
use proptest::prelude::*;

use equipment_datasets::{
    RawTable,
    config::SummaryConfig,
    data::{Cell, parse_table},
    summarize,
};

fn table_from(csv: &str) -> RawTable {
    parse_table(csv.as_bytes(), UTF_8).expect("parse table")
}

fn column_csv(header: &str, values: &[f64]) -> String {
    let mut csv = format!("{header}\n");
    for value in values {
        csv.push_str(&format!("{value}\n"));
    }
    csv
}

#[test]
fn one_extreme_value_among_nineteen_is_an_anomaly() {
    let mut values = vec![10.0; 19];
    values.push(1000.0);
    let summary = summarize(
        table_from(&column_csv("Pressure", &values)),
        &SummaryConfig::default(),
    );
    assert_eq!(summary.anomalies["Pressure"], 1);
    assert_eq!(summary.anomalies["Flowrate"], 0);
    assert_eq!(summary.averages["Pressure"], Some(59.5));
}

#[test]
fn single_outlier_among_nine_stays_below_threshold() {
    let mut values = vec![10.0; 9];
    values.push(100.0);
    let summary = summarize(
        table_from(&column_csv("Temperature", &values)),
        &SummaryConfig::default(),
    );
    assert_eq!(summary.averages["Temperature"], Some(19.0));
    assert_eq!(summary.anomalies["Temperature"], 0);
}

#[test]
fn non_numeric_cells_are_dropped_from_statistics() {
    let summary = summarize(
        table_from("Type,Flowrate\nPump,10\nPump,broken\nValve,\nValve,20\n"),
        &SummaryConfig::default(),
    );
    assert_eq!(summary.total_count, 4);
    assert_eq!(summary.averages["Flowrate"], Some(15.0));
}

#[test]
fn custom_column_roles_drive_the_summary() {
    let config: SummaryConfig = serde_yaml::from_str(
        "columns:\n  - { name: Level, role: numeric }\n  - { name: Unit, role: categorical }\n",
    )
    .expect("config");
    let summary = summarize(table_from("Unit,Level\nA,1\nB,3\nA,\n"), &config);
    assert_eq!(summary.averages.keys().collect::<Vec<_>>(), vec!["Level"]);
    assert_eq!(summary.averages["Level"], Some(2.0));
    assert_eq!(summary.type_distribution["A"], 2);
}

#[test]
fn large_tables_are_capped_reproducibly() {
    let config = SummaryConfig::default();
    let mut csv = String::from("Type,Flowrate\n");
    for idx in 0..50_123 {
        csv.push_str(&format!("T{},{idx}\n", idx % 7));
    }
    let first = summarize(table_from(&csv), &config);
    let second = summarize(table_from(&csv), &config);
    assert_eq!(first.total_count, 50_000);
    assert_eq!(first, second);
    assert_eq!(first.type_distribution.values().sum::<usize>(), 50_000);
}

fn cell_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (-1_000.0f64..1_000.0).prop_map(|v| format!("{v:.3}")),
        Just(String::new()),
        Just("NA".to_string()),
        "[A-Za-z]{1,6}",
    ]
}

proptest! {
    #[test]
    fn total_count_matches_row_count_under_cap(
        rows in proptest::collection::vec((cell_strategy(), cell_strategy()), 1..200)
    ) {
        let mut csv = String::from("Type,Flowrate\n");
        for (kind, flow) in &rows {
            csv.push_str(&format!("{kind},{flow}\n"));
        }
        let table = table_from(&csv);
        let len = table.len();
        let non_missing_types = table
            .column("Type")
            .expect("type column")
            .filter(|cell| !cell.is_missing())
            .count();
        let summary = summarize(table, &SummaryConfig::default());

        prop_assert_eq!(summary.total_count, len);
        prop_assert_eq!(summary.type_distribution.values().sum::<usize>(), non_missing_types);
        prop_assert_eq!(summary.averages["Pressure"], None);
        prop_assert_eq!(summary.anomalies["Pressure"], 0);
    }

    #[test]
    fn constant_columns_never_report_anomalies(value in -1e6f64..1e6, count in 1usize..300) {
        let cells = vec![Cell::Number(value); count];
        let mut table = RawTable::new(vec!["Flowrate".to_string()]);
        for cell in cells {
            table.push_row(vec![cell]).expect("row");
        }
        let summary = summarize(table, &SummaryConfig::default());
        prop_assert_eq!(summary.anomalies["Flowrate"], 0);
    }
}

#[test]
fn rows_of_empty_fields_count_toward_total() {
    let summary = summarize(
        table_from("Type,Flowrate\nPump,1\n,\nValve,2\n"),
        &SummaryConfig::default(),
    );
    assert_eq!(summary.total_count, 3);
    assert_eq!(summary.averages["Flowrate"], Some(1.5));
    assert_eq!(summary.type_distribution.values().sum::<usize>(), 2);
}
