// 公開 API 経由のパイプライン結合テスト（ネットワークなし）

use async_trait::async_trait;

use shipment_scraper::input::{identifiers_from_table, read_table};
use shipment_scraper::output::{write_table, TableFormat};
use shipment_scraper::tracking::{self, InputSource, ProfileKind, TrackingJob};
use shipment_scraper::traits::NullProgress;
use shipment_scraper::types::NOT_FOUND;
use shipment_scraper::{Fetcher, Record, Settings, Table, ToolError};

/// 注文番号を埋め込んだ追跡ページを返す
struct EchoFetcher;

#[async_trait]
impl Fetcher for EchoFetcher {
    async fn fetch(&self, identifier: &str) -> Result<String, ToolError> {
        if identifier.ends_with("-404") {
            return Err(ToolError::HttpStatus {
                status: 404,
                url: format!("http://legacy.local/?OrderNo={}", identifier),
            });
        }
        Ok(format!(
            "<html><body><table><tr><td>x</td></tr></table>\
             <table><tr><td>Order</td><td>{id}</td></tr>\
             <tr><td>Delivered</td><td>2024-05-0{n}</td></tr>\
             <tr><td>Status</td><td>In \"Transit\"</td></tr>\
             </table>\
             <table><tr><td>Refs</td></tr><tr><td></td><td>{id}/A<br>{id}/B</td></tr></table>\
             </body></html>",
            id = identifier,
            n = identifier.len() % 10
        ))
    }
}

fn ids(n: usize) -> Vec<String> {
    (1..=n)
        .map(|i| if i % 4 == 0 { format!("SO-{i}-404") } else { format!("SO-{i}") })
        .collect()
}

#[tokio::test]
async fn n_identifiers_give_n_rows_in_order() {
    for n in [1usize, 5, 12] {
        let pasted = ids(n).join("\n");
        let job = TrackingJob::new(ProfileKind::OrderTracking, InputSource::Pasted(pasted));

        let report = tracking::run(&job, &Settings::default(), &EchoFetcher, &mut NullProgress)
            .await
            .unwrap();

        let table = read_table(&report.artifact.bytes, TableFormat::Csv).unwrap();
        assert_eq!(table.rows.len(), n);
        assert_eq!(identifiers_from_table(&table, "Order Number").unwrap(), ids(n));
        assert_eq!(report.warnings.len(), n / 4);

        for row in &table.rows {
            assert_eq!(row.len(), table.headers.len());
            if row[0].ends_with("-404") {
                assert!(row[1..].iter().all(|v| v == NOT_FOUND));
            } else {
                assert_eq!(row[3], NOT_FOUND, "Signed By row is absent from the fake page");
                assert_eq!(row[4], format!("{0}-A, {0}-B", row[0]));
            }
        }
    }
}

#[tokio::test]
async fn carton_ids_from_xlsx_upload() {
    let mut upload = Table::new(vec!["Qty".into(), "Carton_ID".into()]);
    upload.rows.push(vec!["1".into(), "C-100".into()]);
    upload.rows.push(vec!["2".into(), "C-200".into()]);
    let bytes = write_table(&upload, TableFormat::Xlsx).unwrap();

    let job = TrackingJob::new(
        ProfileKind::CartonLookup,
        InputSource::Table {
            bytes,
            format: TableFormat::Xlsx,
            column: "Carton_ID".into(),
        },
    );
    let report = tracking::run(&job, &Settings::default(), &EchoFetcher, &mut NullProgress)
        .await
        .unwrap();

    let table = read_table(&report.artifact.bytes, TableFormat::Csv).unwrap();
    assert_eq!(table.headers[0], "Carton_ID");
    assert_eq!(table.rows[0][0], "C-100");
    assert_eq!(table.rows[1][0], "C-200");
}

#[test]
fn csv_round_trip_preserves_values() {
    let records: Vec<Record> = (0..7)
        .map(|i| Record {
            id: format!("SO-{i}"),
            values: vec![
                format!("2024-01-0{i}"),
                "line one\nline two".to_string(),
                "quote \"x\", comma".to_string(),
                String::new(),
            ],
        })
        .collect();
    let fields: Vec<String> = ["Date", "Note", "Tricky", "Empty"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let table = Table::from_records("Order Number", &fields, &records);

    let bytes = write_table(&table, TableFormat::Csv).unwrap();
    let parsed = read_table(&bytes, TableFormat::Csv).unwrap();
    assert_eq!(parsed, table);

    let bytes = write_table(&table, TableFormat::Xlsx).unwrap();
    let parsed = read_table(&bytes, TableFormat::Xlsx).unwrap();
    assert_eq!(parsed.rows.len(), records.len());
    assert_eq!(parsed.headers, table.headers);
    for (got, want) in parsed.rows.iter().zip(&table.rows) {
        assert_eq!(&got[..4], &want[..4]);
    }
}

#[tokio::test]
async fn query_table_is_swappable_from_settings() {
    let settings = Settings::from_toml(
        r#"
        sentinel = "-"

        [order_tracking]
        id_header = "Order"
        request = { method = "GET", url = "http://legacy.local/", query_param = "OrderNo" }
        fields = [
            { name = "Echo", query = { path = "//table[2]//tr[1]/td[2]" } },
            { name = "Missing", query = { pattern = 'Weight: (\d+)' } },
        ]
        "#,
    )
    .unwrap();

    let job = TrackingJob::new(ProfileKind::OrderTracking, InputSource::Pasted("SO-9".into()));
    let report = tracking::run(&job, &settings, &EchoFetcher, &mut NullProgress)
        .await
        .unwrap();

    let text = String::from_utf8(report.artifact.bytes).unwrap();
    assert_eq!(text, "Order,Echo,Missing\nSO-9,SO-9,-\n");
}
