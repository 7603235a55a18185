use serde::{Deserialize, Serialize};

/// This models the admission/v1/AdmissionResponse object of Kubernetes
/// See https://pkg.go.dev/k8s.io/kubernetes/pkg/apis/admission#AdmissionResponse
///
/// A response is either an approval, optionally carrying a patch, or a
/// rejection carrying a message. Use `allow` and `reject` to build one: they
/// are the only way to obtain a response that never mixes the two.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    /// UID is an identifier for the individual request/response.
    /// This must be copied over from the corresponding AdmissionRequest.
    pub uid: String,

    /// Allowed indicates whether or not the admission request was permitted.
    pub allowed: bool,

    /// The type of Patch. Currently we only allow "JSONPatch".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<PatchType>,

    /// The patch body, base64 encoded. Currently we only support "JSONPatch"
    /// which implements RFC 6902.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,

    /// Status contains extra details into why an admission request was denied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionResponseStatus>,
}

/// PatchType is the type of patch being used to represent the mutated object
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub enum PatchType {
    #[serde(rename = "JSONPatch")]
    #[default]
    JSONPatch,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub struct AdmissionResponseStatus {
    /// A human-readable description of the status of this operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AdmissionResponse {
    /// Accept the request. `patch` is the already encoded JSON patch, `None`
    /// when the object must be admitted unchanged.
    pub fn allow(uid: String, patch: Option<String>) -> AdmissionResponse {
        let patch_type = patch.as_ref().map(|_| PatchType::JSONPatch);
        AdmissionResponse {
            uid,
            allowed: true,
            patch_type,
            patch,
            status: None,
        }
    }

    pub fn reject(uid: String, message: String) -> AdmissionResponse {
        AdmissionResponse {
            uid,
            allowed: false,
            patch_type: None,
            patch: None,
            status: Some(AdmissionResponseStatus {
                message: Some(message),
            }),
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|status| status.message.as_deref())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    pub api_version: String,
    pub kind: String,
    pub response: AdmissionResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn allow_without_patch() {
        let response = AdmissionResponse::allow("uid".to_owned(), None);

        assert!(response.allowed);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"uid": "uid", "allowed": true})
        );
    }

    #[test]
    fn allow_with_patch_sets_patch_type() {
        let response = AdmissionResponse::allow("uid".to_owned(), Some("W10=".to_owned()));

        assert_eq!(response.patch_type, Some(PatchType::JSONPatch));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"uid": "uid", "allowed": true, "patchType": "JSONPatch", "patch": "W10="})
        );
    }

    #[test]
    fn reject_carries_message_and_no_patch() {
        let response = AdmissionResponse::reject("uid".to_owned(), "nope".to_owned());

        assert!(!response.allowed);
        assert_eq!(response.message(), Some("nope"));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"uid": "uid", "allowed": false, "status": {"message": "nope"}})
        );
    }
}
