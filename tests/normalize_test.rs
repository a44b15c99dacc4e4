//! 正規化パイプラインの性質テスト
//!
//! どんな入力でも5項目がそろい、コードブロック記号や波括弧が残らないことを確認

use agri_waste_common::parser::MIN_ENTRY_CHARS;
use agri_waste_common::{normalize_response, Breakdown, WasteAnalysis};
use serde_json::Value;

const SAMPLES: &[&str] = &[
    "",
    "   ",
    "{}",
    "[]",
    "null",
    "\"just a string\"",
    "This waste can be composted.",
    "```json\n{\"wasteType\": \"Rice Husk\",}\n```",
    "```json\n{\"wasteType\": \"Rice Husk\"",
    "```\n```",
    "{\"wasteType\": {\"name\": \"Straw\"}, \"recyclingMethods\": [{\"method\": \"Mulch\"}, null, 7]}",
    "{\"recyclingMethods\": \"{\\\"recyclingMethods\\\": [\\\"{}\\\", \\\"Composting\\\"]}\"}",
    "{\"marketValue\": {\"{}\": \"{}\"}, \"environmentalImpact\": {\"air\": \"```json```\"}}",
    "Here: {\"wasteType\": \"Bagasse\", \"interestedIndustries\": [\"Paper\", \"{\"]} done",
    "{{{{",
    "}}}} {{{{",
    "[{\"wasteType\": \"Coconut Husk\"}]",
    "\"{\\\"wasteType\\\": \\\"Double Encoded\\\"}\"",
];

fn strings_of(analysis: &WasteAnalysis) -> Vec<String> {
    let mut out = vec![analysis.waste_type.clone()];
    out.extend(analysis.recycling_methods.iter().cloned());
    out.extend(analysis.interested_industries.iter().cloned());
    for breakdown in [&analysis.market_value, &analysis.environmental_impact] {
        match breakdown {
            Breakdown::Text(text) => out.push(text.clone()),
            Breakdown::Keyed(map) => {
                for (k, v) in map {
                    out.push(k.clone());
                    out.push(v.clone());
                }
            }
        }
    }
    out
}

#[test]
fn test_every_input_yields_all_fields() {
    for raw in SAMPLES {
        let analysis = normalize_response(raw);
        let json = serde_json::to_value(&analysis).unwrap();
        for key in [
            "wasteType",
            "recyclingMethods",
            "marketValue",
            "interestedIndustries",
            "environmentalImpact",
        ] {
            assert!(
                json.get(key).is_some_and(|v| !v.is_null()),
                "{} missing for input {:?}",
                key,
                raw
            );
        }
        assert!(!analysis.waste_type.is_empty(), "empty wasteType for {:?}", raw);
        assert!(!analysis.market_value.is_empty());
        assert!(!analysis.environmental_impact.is_empty());
    }
}

#[test]
fn test_no_fences_or_braces_leak() {
    for raw in SAMPLES {
        let analysis = normalize_response(raw);
        for s in strings_of(&analysis) {
            assert!(!s.contains("```"), "fence leaked {:?} from {:?}", s, raw);
            assert!(!s.contains('{') && !s.contains('}'), "brace leaked {:?} from {:?}", s, raw);
        }
    }
}

#[test]
fn test_list_entries_meet_minimum_length() {
    for raw in SAMPLES.iter().filter(|r| r.trim_start().starts_with('{')) {
        let analysis = normalize_response(raw);
        for entry in analysis
            .recycling_methods
            .iter()
            .chain(analysis.interested_industries.iter())
        {
            assert!(entry.chars().count() >= MIN_ENTRY_CHARS, "{:?} from {:?}", entry, raw);
        }
    }
}

#[test]
fn test_clean_json_round_trip_is_identical() {
    let raw = r#"{"wasteType":"Wheat Straw","recyclingMethods":["Mushroom cultivation","Paper pulp"],"marketValue":{"fodder":"₹2000/ton","pulp":"₹3500/ton"},"interestedIndustries":["Paper mills","Dairy farms"],"environmentalImpact":"Avoids stubble burning and PM2.5"}"#;
    let analysis = normalize_response(raw);

    let expected: Value = serde_json::from_str(raw).unwrap();
    assert_eq!(serde_json::to_value(&analysis).unwrap(), expected);
}

#[test]
fn test_fenced_trailing_comma_equals_clean() {
    let clean = r#"{"wasteType":"Rice Husk","recyclingMethods":["Biochar"],"marketValue":"₹1800/ton","interestedIndustries":["Cement"],"environmentalImpact":"Less smoke"}"#;
    let fenced = "```json\n{\"wasteType\":\"Rice Husk\",\"recyclingMethods\":[\"Biochar\",],\"marketValue\":\"₹1800/ton\",\"interestedIndustries\":[\"Cement\"],\"environmentalImpact\":\"Less smoke\",}\n```";
    assert_eq!(normalize_response(fenced), normalize_response(clean));
}

#[test]
fn test_nested_impact_unwrap() {
    let raw = r#"{"wasteType":"Husk","environmentalImpact":"{\"environmentalImpact\": \"reduces CO2\"}"}"#;
    assert_eq!(
        normalize_response(raw).environmental_impact,
        Breakdown::text("reduces CO2")
    );
}

#[test]
fn test_debris_dropped_from_lists() {
    let raw = r#"{"recyclingMethods":["{}","Vermicompost"],"interestedIndustries":["{}","Organic farms"]}"#;
    let analysis = normalize_response(raw);
    assert_eq!(analysis.recycling_methods, vec!["Vermicompost"]);
    assert_eq!(analysis.interested_industries, vec!["Organic farms"]);
}

#[test]
fn test_prose_fallback() {
    let analysis = normalize_response("This waste can be composted.");
    assert_eq!(analysis.recycling_methods, vec!["This waste can be composted."]);
    assert_eq!(analysis.waste_type, "Unknown");
}

#[test]
fn test_double_encoded_record() {
    let analysis = normalize_response(r#""{\"wasteType\": \"Double Encoded\"}""#);
    assert_eq!(analysis.waste_type, "Double Encoded");
}
