use crate::error::InfluxError;
use chrono::{DateTime, SecondsFormat, Utc};
use sprout_core::store::{FieldValue, Point};
use std::collections::{BTreeMap, HashMap};

const RESERVED_COLUMNS: [&str; 9] = [
    "", "result", "table", "_start", "_stop", "_time", "_value", "_field", "_measurement",
];

/// Latest value of every field per series
pub fn latest_query(bucket: &str, measurement: &str, key_tag: &str, key: Option<&str>) -> String {
    let mut query = format!(
        "from(bucket: {})\n  |> range(start: 0)\n  |> filter(fn: (r) => r._measurement == {})\n",
        string(bucket),
        string(measurement)
    );
    if let Some(key) = key {
        query.push_str(&format!(
            "  |> filter(fn: (r) => r[{}] == {})\n",
            string(key_tag),
            string(key)
        ));
    }
    query.push_str("  |> last()");
    query
}

pub fn range_query(
    bucket: &str,
    measurement: &str,
    key_tag: &str,
    key: &str,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) -> String {
    format!(
        "from(bucket: {})\n  |> range(start: {}, stop: {})\n  |> filter(fn: (r) => r._measurement == {} and r[{}] == {})",
        string(bucket),
        from.to_rfc3339_opts(SecondsFormat::Nanos, true),
        until.to_rfc3339_opts(SecondsFormat::Nanos, true),
        string(measurement),
        string(key_tag),
        string(key)
    )
}

/// Delete predicate, which has its own tiny grammar
pub fn delete_predicate(measurement: &str, key_tag: &str, key: &str) -> String {
    format!(
        "_measurement=\"{}\" AND {}=\"{}\"",
        measurement.replace('"', "\\\""),
        key_tag,
        key.replace('"', "\\\"")
    )
}

fn string(raw: &str) -> String {
    let escaped = raw
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace("${", "\\${");
    format!("\"{}\"", escaped)
}

/// Folds an annotated CSV response back into points.
///
/// Every row holds a single field, rows sharing time and tags
/// belong to the same point. Points are returned in response order.
pub fn parse_csv(body: &[u8]) -> Result<Vec<Point>, InfluxError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body);

    let mut datatypes: Vec<String> = Vec::new();
    let mut header: Option<Vec<String>> = None;
    let mut points: Vec<Point> = Vec::new();
    let mut index: HashMap<(DateTime<Utc>, String, BTreeMap<String, String>), usize> = HashMap::new();

    for record in reader.records() {
        let record = record?;
        match record.get(0) {
            Some("#datatype") => {
                datatypes = record.iter().map(str::to_owned).collect();
                header = None;
                continue;
            }
            Some(annotation) if annotation.starts_with('#') => continue,
            _ => {}
        }
        if record.iter().all(str::is_empty) {
            continue;
        }
        if header.is_none() {
            header = Some(record.iter().map(str::to_owned).collect());
            continue;
        }
        let columns = match &header {
            Some(columns) => columns,
            None => continue,
        };

        let mut measurement = String::new();
        let mut time = None;
        let mut field = None;
        let mut value = None;
        let mut tags = BTreeMap::new();
        for (pos, cell) in record.iter().enumerate() {
            let column = match columns.get(pos) {
                Some(column) => column.as_str(),
                None => continue,
            };
            match column {
                "_measurement" => measurement = cell.to_owned(),
                "_time" => time = Some(parse_time(cell)?),
                "_field" => field = Some(cell.to_owned()),
                "_value" => {
                    let datatype = datatypes.get(pos).map(String::as_str).unwrap_or("string");
                    value = Some(parse_value(datatype, cell)?);
                }
                c if RESERVED_COLUMNS.contains(&c) => {}
                tag => {
                    if !cell.is_empty() {
                        tags.insert(tag.to_owned(), cell.to_owned());
                    }
                }
            }
        }

        let (time, field, value) = match (time, field, value) {
            (Some(time), Some(field), Some(value)) => (time, field, value),
            _ => continue,
        };
        let key = (time, measurement, tags);
        match index.get(&key) {
            Some(&pos) => {
                points[pos].fields.insert(field, value);
            }
            None => {
                let mut point = Point::new(&key.1, time);
                point.tags = key.2.clone();
                point.fields.insert(field, value);
                index.insert(key, points.len());
                points.push(point);
            }
        }
    }
    Ok(points)
}

fn parse_time(cell: &str) -> Result<DateTime<Utc>, InfluxError> {
    DateTime::parse_from_rfc3339(cell)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|_| InfluxError::Column {
            column: "_time".to_owned(),
            value: cell.to_owned(),
        })
}

fn parse_value(datatype: &str, cell: &str) -> Result<FieldValue, InfluxError> {
    match datatype {
        "double" | "long" | "unsignedLong" => {
            cell.parse()
                .map(FieldValue::Float)
                .map_err(|_| InfluxError::Column {
                    column: "_value".to_owned(),
                    value: cell.to_owned(),
                })
        }
        _ => Ok(FieldValue::Text(cell.to_owned())),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    const ENTITY_CSV: &str = "#datatype,string,long,dateTime:RFC3339,dateTime:RFC3339,dateTime:RFC3339,string,string,string,string\r\n\
,result,table,_start,_stop,_time,_value,_field,_measurement,deviceId\r\n\
,_result,0,1970-01-01T00:00:00Z,2024-01-01T00:00:00Z,2023-11-14T22:13:20Z,10.0.0.1,ip,device,S1\r\n\
,_result,1,1970-01-01T00:00:00Z,2024-01-01T00:00:00Z,2023-11-14T22:13:20Z,P1,position,device,S1\r\n\
,_result,2,1970-01-01T00:00:00Z,2024-01-01T00:00:00Z,2023-11-14T22:13:25Z,10.0.0.2,ip,device,S2\r\n\
,_result,3,1970-01-01T00:00:00Z,2024-01-01T00:00:00Z,2023-11-14T22:13:25Z,P2,position,device,S2\r\n\
\r\n";

    const READING_CSV: &str = "#datatype,string,long,dateTime:RFC3339,dateTime:RFC3339,dateTime:RFC3339,double,string,string,string,string\r\n\
#group,false,false,true,true,false,false,true,true,true,true\r\n\
#default,_result,,,,,,,,,\r\n\
,result,table,_start,_stop,_time,_value,_field,_measurement,device,position\r\n\
,,0,2023-11-14T00:00:00Z,2023-11-15T00:00:00Z,2023-11-14T22:13:20.5Z,42.5,light,Light_data,S1,P1\r\n\
,,0,2023-11-14T00:00:00Z,2023-11-15T00:00:00Z,2023-11-14T22:13:21Z,43,light,Light_data,S1,P1\r\n\
\r\n";

    #[test]
    fn test_parse_entities() {
        // execute
        let points = parse_csv(ENTITY_CSV.as_bytes()).unwrap();

        // validate
        assert_eq!(2, points.len());
        assert_eq!("device", points[0].measurement);
        assert_eq!(Some("S1"), points[0].tag_value("deviceId"));
        assert_eq!(Some("10.0.0.1"), points[0].text("ip"));
        assert_eq!(Some("P1"), points[0].text("position"));
        assert_eq!(Utc.timestamp_opt(1_700_000_000, 0).unwrap(), points[0].time);
        assert_eq!(Some("P2"), points[1].text("position"));
    }

    #[test]
    fn test_parse_readings() {
        let points = parse_csv(READING_CSV.as_bytes()).unwrap();

        assert_eq!(2, points.len());
        assert_eq!(Some(42.5), points[0].float("light"));
        assert_eq!(Some(43.0), points[1].float("light"));
        assert_eq!(Some("P1"), points[1].tag_value("position"));
        assert_eq!(
            Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap(),
            points[0].time
        );
    }

    #[test]
    fn test_parse_empty_response() {
        assert!(parse_csv(b"\r\n").unwrap().is_empty());
        assert!(parse_csv(b"").unwrap().is_empty());
    }

    #[test]
    fn test_queries_escape_input() {
        let query = latest_query("sensors", "device", "deviceId", Some("x\") or (r"));

        assert!(query.contains(r#"r["deviceId"] == "x\") or (r""#));
        assert!(query.ends_with("|> last()"));
        assert_eq!(
            r#"_measurement="device" AND deviceId="S\"1""#,
            delete_predicate("device", "deviceId", "S\"1")
        );
    }

    #[test]
    fn test_range_query_bounds() {
        let query = range_query(
            "sensors",
            "Light_data",
            "device",
            "S1",
            Utc.timestamp_opt(0, 0).unwrap(),
            Utc.timestamp_opt(60, 0).unwrap(),
        );

        assert!(query.contains(
            "range(start: 1970-01-01T00:00:00.000000000Z, stop: 1970-01-01T00:01:00.000000000Z)"
        ));
    }
}
