//! JSON document accepted by the archive API's deposit endpoint.
//!
//! The shape is fixed by the remote service; only the digital resources,
//! the archive name and the configured descriptive metadata vary.

use serde::Serialize;

use crate::model::PendingFileRecord;
use crate::settings::ArchiveMetadata;

const FINAL_DISPOSITION: &str = "preservation";
const ARCHIVE_STATUS: &str = "preserved";
const FILEPLAN_LEVEL: &str = "item";
const KEYWORD_TYPE: &str = "corpname";
const KEYWORD_CONTENT: &str = "API";
const LANGUAGE: &str = "fra";
const SENT_DATE: &str = "2000-12-23";
const DOCUMENT_TYPE: &str = "Facture";
const FILE_PLAN_POSITION: &str = "2020/Janvier";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivePayload<'a> {
    pub archive: Archive<'a>,
    pub zip_container: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Archive<'a> {
    pub digital_resources: &'a [PendingFileRecord],
    pub archive_name: &'a str,
    pub archival_profile_reference: &'a str,
    pub service_level_reference: &'a str,
    pub final_disposition: &'static str,
    pub retention_rule_status: Option<&'static str>,
    pub classification_rule_code: Option<&'static str>,
    pub classification_rule_duration: Option<&'static str>,
    pub classification_rule_start_date: Option<&'static str>,
    pub classification_end_date: Option<&'static str>,
    pub classification_level: Option<&'static str>,
    pub classification_owner: Option<&'static str>,
    pub user_org_reg_numbers: Option<&'static str>,
    pub last_check_date: Option<&'static str>,
    pub last_delivery_date: Option<&'static str>,
    pub last_modification_date: Option<&'static str>,
    pub status: &'static str,
    pub description: Description<'a>,
    pub full_text_indexation: &'a str,
    pub description_class: &'a str,
    pub fileplan_level: &'static str,
    pub processing_status: Option<&'static str>,
    pub parent_archive_id: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Description<'a> {
    pub title: Vec<&'a str>,
    pub keyword: Vec<Keyword>,
    pub language: Vec<&'static str>,
    pub sent_date: &'static str,
    pub document_type: &'static str,
    pub description_level: &'a str,
    pub file_plan_position: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyword {
    pub keyword_type: &'static str,
    pub keyword_content: &'static str,
}

/// Assemble the payload for `records`. `archive_name` is the archival name
/// of the file whose arrival triggered the submission.
pub fn build_payload<'a>(
    records: &'a [PendingFileRecord],
    archive_name: &'a str,
    metadata: &'a ArchiveMetadata,
) -> ArchivePayload<'a> {
    ArchivePayload {
        archive: Archive {
            digital_resources: records,
            archive_name,
            archival_profile_reference: &metadata.archival_profile_reference,
            service_level_reference: &metadata.service_level_reference,
            final_disposition: FINAL_DISPOSITION,
            retention_rule_status: None,
            classification_rule_code: None,
            classification_rule_duration: None,
            classification_rule_start_date: None,
            classification_end_date: None,
            classification_level: None,
            classification_owner: None,
            user_org_reg_numbers: None,
            last_check_date: None,
            last_delivery_date: None,
            last_modification_date: None,
            status: ARCHIVE_STATUS,
            description: Description {
                title: vec![archive_name],
                keyword: vec![Keyword {
                    keyword_type: KEYWORD_TYPE,
                    keyword_content: KEYWORD_CONTENT,
                }],
                language: vec![LANGUAGE],
                sent_date: SENT_DATE,
                document_type: DOCUMENT_TYPE,
                description_level: &metadata.description_level,
                file_plan_position: vec![FILE_PLAN_POSITION],
            },
            full_text_indexation: &metadata.full_text_indexation,
            description_class: &metadata.description_class,
            fileplan_level: FILEPLAN_LEVEL,
            processing_status: None,
            parent_archive_id: None,
        },
        zip_container: false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn metadata() -> ArchiveMetadata {
        ArchiveMetadata {
            archival_profile_reference: "invoice".into(),
            service_level_reference: "serviceLevel_001".into(),
            description_class: "archivesPubliques".into(),
            description_level: "Item".into(),
            full_text_indexation: "none".into(),
        }
    }

    #[test]
    fn serializes_the_exact_deposit_document() {
        let records = vec![PendingFileRecord {
            encoded_content: "MDEyMzQ1Njc4OQ==".into(),
            size_bytes: "10".into(),
            file_name: "a".into(),
            mime_type: "text/plain".into(),
        }];
        let metadata = metadata();

        let value =
            serde_json::to_value(build_payload(&records, "a", &metadata))
                .unwrap();

        assert_eq!(
            value,
            json!({
                "archive": {
                    "digitalResources": [{
                        "handler": "MDEyMzQ1Njc4OQ==",
                        "size": "10",
                        "fileName": "a",
                        "mimetype": "text/plain"
                    }],
                    "archiveName": "a",
                    "archivalProfileReference": "invoice",
                    "serviceLevelReference": "serviceLevel_001",
                    "finalDisposition": "preservation",
                    "retentionRuleStatus": null,
                    "classificationRuleCode": null,
                    "classificationRuleDuration": null,
                    "classificationRuleStartDate": null,
                    "classificationEndDate": null,
                    "classificationLevel": null,
                    "classificationOwner": null,
                    "userOrgRegNumbers": null,
                    "lastCheckDate": null,
                    "lastDeliveryDate": null,
                    "lastModificationDate": null,
                    "status": "preserved",
                    "description": {
                        "title": ["a"],
                        "keyword": [{
                            "keywordType": "corpname",
                            "keywordContent": "API"
                        }],
                        "language": ["fra"],
                        "sentDate": "2000-12-23",
                        "documentType": "Facture",
                        "descriptionLevel": "Item",
                        "filePlanPosition": ["2020/Janvier"]
                    },
                    "fullTextIndexation": "none",
                    "descriptionClass": "archivesPubliques",
                    "fileplanLevel": "item",
                    "processingStatus": null,
                    "parentArchiveId": null
                },
                "zipContainer": false
            })
        );
    }

    #[test]
    fn archive_name_is_the_trigger_not_the_batch() {
        let records: Vec<_> = ["old", "new"]
            .into_iter()
            .map(|name| PendingFileRecord {
                encoded_content: String::new(),
                size_bytes: "0".into(),
                file_name: name.into(),
                mime_type: "text/plain".into(),
            })
            .collect();
        let metadata = metadata();

        let payload = build_payload(&records, "new", &metadata);

        assert_eq!(payload.archive.digital_resources.len(), 2);
        assert_eq!(payload.archive.archive_name, "new");
        assert_eq!(payload.archive.description.title, vec!["new"]);
    }
}
