//! Read-boundary validation: JSON values → typed records.
//!
//! Records are checked once here so the flatten/join stages can rely on typed
//! fields. Missing required fields raise `SchemaMismatch`; join key fields
//! that are present but not strings raise `JoinKeyTypeMismatch`.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Dataset, TransformError};
use crate::types::{CampaignInfo, UserCampaign};

/// A required field and every spelling accepted for it
struct Required {
    name: &'static str,
    spellings: &'static [&'static str],
    join_key: bool,
}

const CAMPAIGN_ID: Required = Required {
    name: "campaignID",
    spellings: &["campaignID", "campaignid", "campaignId"],
    join_key: true,
};

const TASK_ID: Required = Required {
    name: "taskID",
    spellings: &["taskID", "taskid", "taskId"],
    join_key: true,
};

const USER_ID: Required = Required {
    name: "userID",
    spellings: &["userID", "userid", "userId"],
    join_key: false,
};

const CREATED_AT: Required = Required {
    name: "createdAt",
    spellings: &["createdAt", "createdat"],
    join_key: false,
};

const CAMPAIGN_INFO_FIELDS: &[Required] = &[CAMPAIGN_ID];
const CAMPAIGN_TASK_FIELDS: &[Required] = &[TASK_ID];
const USER_CAMPAIGN_FIELDS: &[Required] = &[USER_ID, CAMPAIGN_ID, CREATED_AT];
const PROGRESS_DETAIL_FIELDS: &[Required] = &[TASK_ID];

const TASK_ARRAY: &[&str] = &["tasks", "campaigntasks", "campaignTasks"];
const PROGRESS_ARRAY: &[&str] = &["progressDetails", "progressdetails"];

/// Validate and decode one CampaignInfo record.
///
/// `record` is the 1-based position used in error messages.
pub fn decode_campaign_info(value: Value, record: usize) -> Result<CampaignInfo, TransformError> {
    let dataset = Dataset::CampaignInfo;
    let obj = as_object(&value, dataset, record)?;
    check_fields(obj, CAMPAIGN_INFO_FIELDS, dataset, record, "")?;
    check_elements(obj, TASK_ARRAY, CAMPAIGN_TASK_FIELDS, dataset, record)?;
    deserialize(value, dataset, record)
}

/// Validate and decode one UserCampaign record.
pub fn decode_user_campaign(value: Value, record: usize) -> Result<UserCampaign, TransformError> {
    let dataset = Dataset::UserCampaign;
    let obj = as_object(&value, dataset, record)?;
    check_fields(obj, USER_CAMPAIGN_FIELDS, dataset, record, "")?;
    check_elements(obj, PROGRESS_ARRAY, PROGRESS_DETAIL_FIELDS, dataset, record)?;
    deserialize(value, dataset, record)
}

fn as_object(
    value: &Value,
    dataset: Dataset,
    record: usize,
) -> Result<&Map<String, Value>, TransformError> {
    value
        .as_object()
        .ok_or_else(|| TransformError::SchemaMismatch {
            dataset,
            record,
            detail: format!("expected a JSON object, found {}", type_name(value)),
        })
}

fn check_fields(
    obj: &Map<String, Value>,
    fields: &[Required],
    dataset: Dataset,
    record: usize,
    path: &str,
) -> Result<(), TransformError> {
    for field in fields {
        let found = field
            .spellings
            .iter()
            .find_map(|s| obj.get(*s))
            .filter(|v| !v.is_null());

        match found {
            None => {
                return Err(TransformError::SchemaMismatch {
                    dataset,
                    record,
                    detail: format!("missing required field '{}{}'", path, field.name),
                })
            }
            Some(Value::String(_)) => {}
            Some(other) if field.join_key => {
                return Err(TransformError::JoinKeyTypeMismatch {
                    dataset,
                    record,
                    field: format!("{}{}", path, field.name),
                    found: type_name(other),
                })
            }
            Some(other) => {
                return Err(TransformError::SchemaMismatch {
                    dataset,
                    record,
                    detail: format!(
                        "field '{}{}' must be a string, found {}",
                        path,
                        field.name,
                        type_name(other)
                    ),
                })
            }
        }
    }
    Ok(())
}

fn check_elements(
    obj: &Map<String, Value>,
    array_spellings: &[&str],
    fields: &[Required],
    dataset: Dataset,
    record: usize,
) -> Result<(), TransformError> {
    let Some((name, array)) = array_spellings
        .iter()
        .find_map(|s| obj.get(*s).map(|v| (*s, v)))
    else {
        return Ok(());
    };

    match array {
        Value::Null => Ok(()),
        Value::Array(elements) => {
            for (idx, element) in elements.iter().enumerate() {
                let path = format!("{}[{}].", name, idx);
                let element = element
                    .as_object()
                    .ok_or_else(|| TransformError::SchemaMismatch {
                        dataset,
                        record,
                        detail: format!(
                            "'{}' must be an object, found {}",
                            path.trim_end_matches('.'),
                            type_name(element)
                        ),
                    })?;
                check_fields(element, fields, dataset, record, &path)?;
            }
            Ok(())
        }
        other => Err(TransformError::SchemaMismatch {
            dataset,
            record,
            detail: format!("'{}' must be an array, found {}", name, type_name(other)),
        }),
    }
}

fn deserialize<T: DeserializeOwned>(
    value: Value,
    dataset: Dataset,
    record: usize,
) -> Result<T, TransformError> {
    serde_json::from_value(value).map_err(|e| TransformError::SchemaMismatch {
        dataset,
        record,
        detail: e.to_string(),
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
