use base64::{Engine as _, engine::general_purpose};
use k8s_openapi::apimachinery::pkg::runtime::RawExtension;
use serde::de::DeserializeOwned;

use crate::{
    admission_request::{AdmissionRequest, AdmissionReviewRequest},
    admission_response::{AdmissionResponse, AdmissionReviewResponse},
    errors::{CodecError, Result},
    patch::PatchOperation,
};

pub const DEFAULT_API_VERSION: &str = "admission.k8s.io/v1";
pub const DEFAULT_KIND: &str = "AdmissionReview";

/// `apiVersion` and `kind` of a review envelope. The response envelope must
/// use the same values as the request it answers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewTypeMeta {
    pub api_version: String,
    pub kind: String,
}

/// A review envelope whose inner request is known to be present.
#[derive(Clone, Debug)]
pub struct DecodedReview {
    pub type_meta: ReviewTypeMeta,
    pub request: AdmissionRequest,
}

/// Translates between the wire representation of admission reviews and
/// their in-memory types.
///
/// The codec is immutable: build it once at startup and share it. It holds
/// the envelope type used when an inbound review does not declare one.
#[derive(Clone, Debug)]
pub struct ReviewCodec {
    default_type_meta: ReviewTypeMeta,
}

impl Default for ReviewCodec {
    fn default() -> Self {
        ReviewCodec::new(DEFAULT_API_VERSION, DEFAULT_KIND)
    }
}

impl ReviewCodec {
    pub fn new(api_version: &str, kind: &str) -> Self {
        ReviewCodec {
            default_type_meta: ReviewTypeMeta {
                api_version: api_version.to_owned(),
                kind: kind.to_owned(),
            },
        }
    }

    pub fn default_type_meta(&self) -> &ReviewTypeMeta {
        &self.default_type_meta
    }

    pub fn decode_review(&self, bytes: &[u8]) -> Result<DecodedReview> {
        let review: AdmissionReviewRequest =
            serde_json::from_slice(bytes).map_err(CodecError::MalformedEnvelope)?;
        let request = review.request.ok_or(CodecError::MissingRequest)?;

        Ok(DecodedReview {
            type_meta: ReviewTypeMeta {
                api_version: review
                    .api_version
                    .unwrap_or_else(|| self.default_type_meta.api_version.clone()),
                kind: review
                    .kind
                    .unwrap_or_else(|| self.default_type_meta.kind.clone()),
            },
            request,
        })
    }

    /// Decode the object carried by an admission request into `T`.
    ///
    /// When the object declares its `kind`, it must match `expected_kind`.
    pub fn decode_target<T: DeserializeOwned>(
        &self,
        object: Option<&RawExtension>,
        expected_kind: &str,
    ) -> Result<T> {
        let object = object.ok_or(CodecError::MissingObject)?;
        if object.0.is_null() {
            return Err(CodecError::MissingObject);
        }

        if let Some(kind) = object.0.get("kind").and_then(|kind| kind.as_str()) {
            if kind != expected_kind {
                return Err(CodecError::UnexpectedKind {
                    expected: expected_kind.to_owned(),
                    found: kind.to_owned(),
                });
            }
        }

        T::deserialize(&object.0).map_err(CodecError::Decode)
    }

    /// Serialize the patch operations, preserving their order, and encode
    /// them with base64. An empty list produces no patch at all.
    pub fn encode_patch(&self, operations: &[PatchOperation]) -> Result<Option<String>> {
        if operations.is_empty() {
            return Ok(None);
        }

        let patch = serde_json::to_vec(operations).map_err(CodecError::Encode)?;
        Ok(Some(general_purpose::STANDARD.encode(patch)))
    }

    pub fn decode_patch(&self, patch: &str) -> Result<Vec<PatchOperation>> {
        let raw = general_purpose::STANDARD
            .decode(patch)
            .map_err(|e| CodecError::PatchDecode(e.to_string()))?;
        serde_json::from_slice(&raw).map_err(|e| CodecError::PatchDecode(e.to_string()))
    }

    pub fn encode_response(
        &self,
        type_meta: &ReviewTypeMeta,
        response: AdmissionResponse,
    ) -> Result<Vec<u8>> {
        let review = AdmissionReviewResponse {
            api_version: type_meta.api_version.clone(),
            kind: type_meta.kind.clone(),
            response,
        };

        serde_json::to_vec(&review).map_err(CodecError::Encode)
    }

    pub fn decode_response(&self, bytes: &[u8]) -> Result<AdmissionReviewResponse> {
        serde_json::from_slice(bytes).map_err(CodecError::MalformedEnvelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::Pod;
    use rstest::*;
    use serde_json::json;

    fn codec() -> ReviewCodec {
        ReviewCodec::default()
    }

    #[test]
    fn decode_review_with_request() {
        let body = json!({
            "apiVersion": "admission.k8s.io/v1beta1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
                "kind": {"group": "", "version": "v1", "kind": "Pod"},
                "resource": {"group": "", "version": "v1", "resource": "pods"},
                "namespace": "default",
                "operation": "CREATE",
                "object": {"kind": "Pod", "metadata": {"name": "nginx"}}
            }
        });

        let review = codec()
            .decode_review(&serde_json::to_vec(&body).unwrap())
            .expect("decoding should work");

        assert_eq!(review.request.uid, "705ab4f5-6393-11e8-b7cc-42010a800002");
        assert_eq!(review.request.namespace(), "default");
        assert_eq!(review.type_meta.api_version, "admission.k8s.io/v1beta1");
        assert_eq!(review.type_meta.kind, "AdmissionReview");
    }

    #[test]
    fn decode_review_falls_back_to_default_type_meta() {
        let body = br#"{"request": {"uid": "1", "kind": {"version": "v1", "kind": "Pod"}, "resource": {"version": "v1", "resource": "pods"}}}"#;
        let review = codec().decode_review(body).unwrap();

        assert_eq!(review.type_meta, *codec().default_type_meta());
    }

    #[rstest]
    #[case::not_json(b"this is not json".as_slice())]
    #[case::wrong_shape(br#"{"request": "a string"}"#.as_slice())]
    #[case::request_without_uid(br#"{"request": {"kind": {"version": "v1", "kind": "Pod"}}}"#.as_slice())]
    fn decode_review_malformed(#[case] body: &[u8]) {
        let error = codec().decode_review(body).unwrap_err();
        assert!(matches!(error, CodecError::MalformedEnvelope(_)));
    }

    #[rstest]
    #[case::absent(br#"{"kind": "AdmissionReview"}"#.as_slice())]
    #[case::null(br#"{"request": null}"#.as_slice())]
    #[case::empty(b"{}".as_slice())]
    fn decode_review_missing_request(#[case] body: &[u8]) {
        let error = codec().decode_review(body).unwrap_err();
        assert!(matches!(error, CodecError::MissingRequest));
        assert_eq!(
            error.to_string(),
            "malformed admission review: request is nil"
        );
    }

    #[test]
    fn decode_target_pod() {
        let object = RawExtension(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": "nginx"},
            "spec": {"containers": [{"name": "nginx", "image": "nginx"}]}
        }));

        let pod: Pod = codec().decode_target(Some(&object), "Pod").unwrap();
        assert_eq!(pod.metadata.name.as_deref(), Some("nginx"));
        assert_eq!(pod.spec.unwrap().containers[0].name, "nginx");
    }

    #[test]
    fn decode_target_wrong_kind() {
        let object = RawExtension(json!({"apiVersion": "apps/v1", "kind": "Deployment"}));

        let error = codec()
            .decode_target::<Pod>(Some(&object), "Pod")
            .unwrap_err();
        assert!(matches!(error, CodecError::UnexpectedKind { .. }));
    }

    #[rstest]
    #[case::absent(None)]
    #[case::null(Some(RawExtension(serde_json::Value::Null)))]
    fn decode_target_missing_object(#[case] object: Option<RawExtension>) {
        let error = codec()
            .decode_target::<Pod>(object.as_ref(), "Pod")
            .unwrap_err();
        assert!(matches!(error, CodecError::MissingObject));
    }

    #[test]
    fn decode_target_schema_mismatch() {
        let object = RawExtension(json!({"kind": "Pod", "spec": {"containers": "nope"}}));

        let error = codec()
            .decode_target::<Pod>(Some(&object), "Pod")
            .unwrap_err();
        assert!(matches!(error, CodecError::Decode(_)));
    }

    #[test]
    fn empty_patch_is_not_encoded() {
        assert_eq!(codec().encode_patch(&[]).unwrap(), None);
    }

    #[test]
    fn patch_order_is_preserved() {
        let operations = vec![
            PatchOperation::add("/metadata/labels", json!({})),
            PatchOperation::add("/metadata/labels/owner", json!("team-a")),
            PatchOperation::remove("/metadata/annotations/debug"),
        ];

        let encoded = codec().encode_patch(&operations).unwrap().unwrap();
        let raw = general_purpose::STANDARD.decode(&encoded).unwrap();
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&raw).unwrap(),
            json!([
                {"op": "add", "path": "/metadata/labels", "value": {}},
                {"op": "add", "path": "/metadata/labels/owner", "value": "team-a"},
                {"op": "remove", "path": "/metadata/annotations/debug"},
            ])
        );

        assert_eq!(codec().decode_patch(&encoded).unwrap(), operations);
    }

    #[test]
    fn null_patch_values_round_trip() {
        let operations = vec![
            PatchOperation::add("/metadata/labels", serde_json::Value::Null),
            PatchOperation::replace("/spec/nodeName", serde_json::Value::Null),
        ];

        let encoded = codec().encode_patch(&operations).unwrap().unwrap();
        let decoded = codec().decode_patch(&encoded).unwrap();

        assert_eq!(decoded, operations);
        assert_eq!(decoded[0].value(), Some(&serde_json::Value::Null));
    }

    #[test]
    fn patch_with_missing_value_is_refused() {
        let encoded = general_purpose::STANDARD
            .encode(br#"[{"op": "add", "path": "/metadata/labels"}]"#);

        let error = codec().decode_patch(&encoded).unwrap_err();
        assert!(matches!(error, CodecError::PatchDecode(_)), "{error}");
    }

    #[test]
    fn response_round_trip_allowed_with_patch() {
        let codec = codec();
        let operations = vec![PatchOperation::replace("/spec/replicas", json!(2))];
        let patch = codec.encode_patch(&operations).unwrap();
        let response = AdmissionResponse::allow("uid-1".to_owned(), patch);

        let bytes = codec
            .encode_response(codec.default_type_meta(), response.clone())
            .unwrap();
        let decoded = codec.decode_response(&bytes).unwrap();

        assert_eq!(decoded.api_version, DEFAULT_API_VERSION);
        assert_eq!(decoded.kind, DEFAULT_KIND);
        assert_eq!(decoded.response, response);
        assert_eq!(
            codec
                .decode_patch(decoded.response.patch.as_deref().unwrap())
                .unwrap(),
            operations
        );
    }

    #[test]
    fn response_round_trip_rejected() {
        let codec = codec();
        let response = AdmissionResponse::reject("uid-2".to_owned(), "denied".to_owned());

        let bytes = codec
            .encode_response(codec.default_type_meta(), response.clone())
            .unwrap();
        let decoded = codec.decode_response(&bytes).unwrap();

        assert_eq!(decoded.response.uid, "uid-2");
        assert!(!decoded.response.allowed);
        assert_eq!(decoded.response.message(), Some("denied"));
        assert!(decoded.response.patch.is_none());
    }
}
