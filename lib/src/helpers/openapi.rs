use aide::openapi::{
	MediaType, OpenApi, Operation, PathItem, ReferenceOr, RequestBody, Response, Responses,
	SchemaObject, StatusCode,
};
use axum::http::Method;
use indexmap::IndexMap;
use schemars::{
	gen::SchemaGenerator,
	schema::{InstanceType, Schema, SchemaObject as JsonSchemaObject},
	JsonSchema,
};

pub const MULTIPART: &str = "multipart/form-data";
pub const JSON: &str = "application/json";

/// Schema of a multipart form whose fields are all required files.
pub fn file_form_schema(fields: &[(&str, &str)]) -> JsonSchemaObject {
	let mut form = JsonSchemaObject {
		instance_type: Some(InstanceType::Object.into()),
		..JsonSchemaObject::default()
	};

	for (name, description) in fields {
		let mut file = JsonSchemaObject {
			instance_type: Some(InstanceType::String.into()),
			format: Some("binary".to_string()),
			..JsonSchemaObject::default()
		};
		file.metadata().description = Some((*description).to_string());

		form.object().properties.insert((*name).to_string(), file.into());
		form.object().required.insert((*name).to_string());
	}

	form
}

pub fn media(json_schema: Schema) -> IndexMap<String, MediaType> {
	IndexMap::from([(
		JSON.to_string(),
		MediaType {
			schema: Some(schema_object(json_schema)),
			..MediaType::default()
		},
	)])
}

pub fn json_response<T: JsonSchema>(
	generator: &mut SchemaGenerator,
	description: &str,
) -> ReferenceOr<Response> {
	ReferenceOr::Item(Response {
		description: description.to_string(),
		content: media(generator.subschema_for::<T>()),
		..Response::default()
	})
}

/// Build an operation taking a required request body of `media_type` and answering with the given responses.
pub fn operation(
	summary: &str,
	(media_type, body): (&str, JsonSchemaObject),
	responses: impl IntoIterator<Item = (u16, ReferenceOr<Response>)>,
) -> Operation {
	Operation {
		summary: Some(summary.to_string()),
		request_body: Some(ReferenceOr::Item(RequestBody {
			content: IndexMap::from([(
				media_type.to_string(),
				MediaType {
					schema: Some(schema_object(Schema::Object(body))),
					..MediaType::default()
				},
			)]),
			required: true,
			..RequestBody::default()
		})),
		responses: Some(Responses {
			responses: responses
				.into_iter()
				.map(|(code, response)| (StatusCode::Code(code), response))
				.collect(),
			..Responses::default()
		}),
		..Operation::default()
	}
}

/// Add (or replace) the operation for `method` at `path`.
pub fn insert_operation(
	api: &mut OpenApi,
	path: &str,
	method: &Method,
	operation: Operation,
) -> Option<()> {
	let item = api
		.paths
		.get_or_insert_with(Default::default)
		.paths
		.entry(path.to_string())
		.or_insert_with(|| ReferenceOr::Item(PathItem::default()))
		.as_item_mut()?;

	let slot = match *method {
		Method::GET => &mut item.get,
		Method::PUT => &mut item.put,
		Method::POST => &mut item.post,
		Method::HEAD => &mut item.head,
		Method::TRACE => &mut item.trace,
		Method::DELETE => &mut item.delete,
		Method::OPTIONS => &mut item.options,
		_ => return None,
	};
	*slot = Some(operation);

	Some(())
}

const fn schema_object(json_schema: Schema) -> SchemaObject {
	SchemaObject {
		json_schema,
		example: None,
		external_docs: None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn file_form_requires_every_field() {
		let schema = serde_json::to_value(file_form_schema(&[("image", "Photo")])).unwrap();

		assert_eq!(schema["type"], "object");
		assert_eq!(schema["required"], serde_json::json!(["image"]));
		assert_eq!(schema["properties"]["image"]["format"], "binary");
		assert_eq!(schema["properties"]["image"]["description"], "Photo");
	}

	#[test]
	fn inserts_operation_under_path_and_method() {
		let mut api = OpenApi::default();
		let op = operation("Upload", (MULTIPART, file_form_schema(&[])), []);

		insert_operation(&mut api, "/upload", &Method::POST, op).unwrap();

		let item = api.paths.unwrap().paths["/upload"].clone();
		let ReferenceOr::Item(item) = item else {
			panic!("expected an inline path item");
		};
		assert_eq!(item.post.unwrap().summary.as_deref(), Some("Upload"));
		assert!(item.get.is_none());
	}
}
