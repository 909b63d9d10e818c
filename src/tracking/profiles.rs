//! 既定のプロファイル（リクエスト雛形とクエリテーブル）
//!
//! 対象サイトの表の位置がずれたらここ（または設定ファイル）を直す

use std::collections::BTreeMap;

use crate::config::ProfileSettings;
use crate::extract::FieldSpec;
use crate::fetch::RequestTemplate;

const ORDER_STATUS_URL: &str = "https://legacy-tracking.example.com/OrderStatus.aspx";
const CARTON_INQUIRY_URL: &str = "https://legacy-tracking.example.com/CartonInquiry.aspx";

pub const ORDER_ID_HEADER: &str = "Order Number";
pub const CARTON_ID_COLUMN: &str = "Carton_ID";
pub const REFERENCES_FIELD: &str = "References";
pub const DEFAULT_ASN_COLUMN: &str = "Reference";

/// 注文追跡（GET ?OrderNo=）
pub fn order_tracking() -> ProfileSettings {
    ProfileSettings {
        request: RequestTemplate::Get {
            url: ORDER_STATUS_URL.to_string(),
            query_param: "OrderNo".to_string(),
        },
        id_header: ORDER_ID_HEADER.to_string(),
        fields: vec![
            FieldSpec::path("Delivery Date", "//table[2]//tr[2]/td[2]"),
            FieldSpec::path("Status", "//table[2]//tr[3]/td[2]"),
            FieldSpec::path("Signed By", "//table[2]//tr[4]/td[2]"),
            FieldSpec::path(REFERENCES_FIELD, "//table[3]//tr[2]/td[2]/text()"),
        ],
    }
}

/// カートン照会（POST フォーム）
pub fn carton_lookup() -> ProfileSettings {
    let mut form = BTreeMap::new();
    form.insert("Action".to_string(), "Search".to_string());
    form.insert("SearchType".to_string(), "Carton".to_string());

    ProfileSettings {
        request: RequestTemplate::Post {
            url: CARTON_INQUIRY_URL.to_string(),
            id_field: "CartonID".to_string(),
            form,
        },
        id_header: CARTON_ID_COLUMN.to_string(),
        fields: vec![
            FieldSpec::path("Order Number", "//table[2]//tr[2]/td[2]"),
            FieldSpec::path("Carton Status", "//table[2]//tr[3]/td[2]"),
            FieldSpec::path("Ship Date", "//table[2]//tr[4]/td[2]"),
            FieldSpec::pattern("Weight", r"Weight:\s*([\d.]+\s*(?:kg|lb)s?)"),
            FieldSpec::pattern("Tracking Number", r"\b(1Z[0-9A-Z]{16})\b"),
        ],
    }
}
