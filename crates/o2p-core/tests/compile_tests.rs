use o2p_core::config::{CompilerOptions, EmitterOptions, ServiceGrouping};
use o2p_core::document::DocumentSet;
use o2p_core::emit::render_proto;
use o2p_core::error::{CompileError, CompileIssue};
use o2p_core::ir::{FieldType, HttpMethod, Scalar, WellKnown};
use o2p_core::parse::decode_yaml;
use o2p_core::transform::{Compilation, FieldNumberMap, compile};

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");
const PETSTORE_V2: &str = include_str!("fixtures/petstore-v2.yaml");
const FEATURES: &str = include_str!("fixtures/features.yaml");
const COMPOSITION: &str = include_str!("fixtures/composition.yaml");
const MULTI_ROOT: &str = include_str!("fixtures/multi/openapi.yaml");
const MULTI_PET: &str = include_str!("fixtures/multi/Pet.yaml");
const MULTI_COMMON: &str = include_str!("fixtures/multi/common.yaml");

const ROOT: &str = "file:///specs/openapi.yaml";

fn documents(yaml: &str) -> DocumentSet {
    DocumentSet::new(ROOT, decode_yaml(yaml).unwrap()).unwrap()
}

fn compile_yaml(yaml: &str, options: &CompilerOptions) -> Compilation {
    compile(&documents(yaml), options, None).unwrap()
}

fn render(compilation: &Compilation) -> String {
    render_proto(&compilation.file, &EmitterOptions::default()).unwrap()
}

fn field_numbers(compilation: &Compilation, message: &str) -> Vec<(String, u32)> {
    compilation
        .file
        .message(message)
        .unwrap()
        .fields
        .iter()
        .map(|f| (f.name.clone(), f.number))
        .collect()
}

#[test]
fn petstore_round_trip() {
    let compiled = compile_yaml(PETSTORE, &CompilerOptions::default());
    assert!(compiled.is_clean());

    let pet = compiled.file.message("Pet").unwrap();
    assert_eq!(pet.fields.len(), 2);
    assert_eq!(pet.fields[0].number, 1);
    assert_eq!(pet.fields[1].number, 2);

    assert_eq!(compiled.file.services.len(), 1);
    let service = &compiled.file.services[0];
    assert_eq!(service.rpcs.len(), 1);
    assert_eq!(service.rpcs[0].output, "Pet");

    assert_eq!(render(&compiled), include_str!("fixtures/petstore.proto"));
}

#[test]
fn compilation_is_deterministic() {
    let options = CompilerOptions::default()
        .with_annotation(true)
        .with_service_grouping(ServiceGrouping::Tag);
    let first = render(&compile_yaml(FEATURES, &options));
    let second = render(&compile_yaml(FEATURES, &options));
    assert_eq!(first, second);
}

#[test]
fn field_numbers_survive_schema_changes() {
    let v1 = compile_yaml(PETSTORE, &CompilerOptions::default());
    let previous = v1.file.field_numbers();

    let v2 = compile(
        &documents(PETSTORE_V2),
        &CompilerOptions::default(),
        Some(&previous),
    )
    .unwrap();
    assert_eq!(
        field_numbers(&v2, "Pet"),
        vec![("tag".to_string(), 3), ("id".to_string(), 1)]
    );
    assert_eq!(v2.file.message("Pet").unwrap().reserved, vec![2]);

    // The lock file format round-trips through YAML.
    let yaml = serde_yaml_ng::to_string(&previous).unwrap();
    let reread: FieldNumberMap = serde_yaml_ng::from_str(&yaml).unwrap();
    assert_eq!(reread, previous);
}

#[test]
fn enums_start_with_unspecified() {
    let compiled = compile_yaml(FEATURES, &CompilerOptions::default());
    let status = compiled.file.enum_type("Status").unwrap();
    let values: Vec<(&str, u32)> = status
        .values
        .iter()
        .map(|v| (v.label.as_str(), v.number))
        .collect();
    assert_eq!(
        values,
        vec![
            ("STATUS_UNSPECIFIED", 0),
            ("AVAILABLE", 1),
            ("PENDING", 2),
            ("SOLD", 3)
        ]
    );
}

#[test]
fn colliding_names_get_suffixes() {
    let compiled = compile_yaml(
        r#"
swagger: "2.0"
info: { title: Names, version: "1" }
definitions:
  pet:
    type: object
    properties:
      petId: { type: string }
      pet_id: { type: string }
      pet-id: { type: string }
  Pet:
    type: object
    properties:
      name: { type: string }
"#,
        &CompilerOptions::default(),
    );
    let names: Vec<&str> = compiled.file.messages.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Pet", "Pet2"]);
    let fields: Vec<&str> = compiled.file.messages[0]
        .fields
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(fields, vec!["pet_id", "pet_id2", "pet_id3"]);
}

#[test]
fn all_of_merges_disjoint_branches_without_renaming() {
    let compiled = compile_yaml(COMPOSITION, &CompilerOptions::default());
    let dog = compiled.file.message("Dog").unwrap();
    let fields: Vec<(&str, bool)> = dog
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.required))
        .collect();
    assert_eq!(fields, vec![("id", true), ("name", false), ("breed", true)]);
}

#[test]
fn all_of_collisions_use_suffix_or_prefix() {
    let compiled = compile_yaml(COMPOSITION, &CompilerOptions::default());
    let cat = compiled.file.message("Cat").unwrap();
    let fields: Vec<&str> = cat.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, vec!["id", "name", "name2", "lives"]);

    let compiled = compile_yaml(
        COMPOSITION,
        &CompilerOptions::default().with_allof_prefix("base_"),
    );
    let cat = compiled.file.message("Cat").unwrap();
    let fields: Vec<&str> = cat.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, vec!["id", "name", "base_cat_name", "lives"]);
}

#[test]
fn self_reference_compiles_to_back_reference() {
    let compiled = compile_yaml(COMPOSITION, &CompilerOptions::default());
    let node = compiled.file.message("Node").unwrap();
    assert_eq!(node.fields[1].name, "next");
    assert_eq!(node.fields[1].field_type, FieldType::Ref("Node".into()));
    assert!(compiled.is_clean());
}

#[test]
fn nested_types_do_not_capture_top_level_references() {
    let compiled = compile_yaml(
        r##"
swagger: "2.0"
info: { title: Shadow, version: "1" }
definitions:
  Owner:
    type: object
    properties:
      id: { type: integer, format: int64 }
  Pet:
    type: object
    properties:
      owner:
        type: object
        properties:
          name: { type: string }
      real_owner: { $ref: "#/definitions/Owner" }
  Node:
    type: object
    properties:
      node:
        type: object
        properties:
          value: { type: string }
      next: { $ref: "#/definitions/Node" }
"##,
        &CompilerOptions::default(),
    );
    assert!(compiled.is_clean(), "{:?}", compiled.issues);
    let text = render(&compiled);
    assert!(text.contains("message Pet {\n  message Owner {\n    string name = 1;\n  }\n"));
    assert!(text.contains("  Owner owner = 1;\n  .shadow.Owner real_owner = 2;\n"));
    assert!(text.contains("  Node node = 1;\n  .shadow.Node next = 2;\n"));
}

#[test]
fn skip_rpcs_leaves_schema_output_unchanged() {
    let full = compile_yaml(FEATURES, &CompilerOptions::default());
    let schema_only = compile_yaml(FEATURES, &CompilerOptions::default().with_skip_rpcs(true));

    assert!(schema_only.file.services.is_empty());
    assert_eq!(schema_only.file.enums, full.file.enums);
    let names: Vec<&str> = schema_only
        .file
        .messages
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(names, vec!["Pet"]);
    assert_eq!(schema_only.file.message("Pet"), full.file.message("Pet"));
}

#[test]
fn skip_rpcs_keeps_types_reached_only_from_operations() {
    let yaml = r#"
openapi: 3.0.0
info: { title: Sibling, version: "1" }
paths:
  /pets/favorite:
    get:
      operationId: getFavorite
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema: { $ref: "Pet.yaml" }
components:
  schemas:
    Owner:
      type: object
      properties:
        name: { type: string }
"#;
    let compile_with = |options: &CompilerOptions| {
        let mut documents = documents(yaml);
        documents
            .insert("file:///specs/Pet.yaml", decode_yaml(MULTI_PET).unwrap())
            .unwrap();
        compile(&documents, options, None).unwrap()
    };
    let full = compile_with(&CompilerOptions::default());
    let schema_only = compile_with(&CompilerOptions::default().with_skip_rpcs(true));

    assert!(schema_only.is_clean());
    assert!(schema_only.file.services.is_empty());
    let names: Vec<&str> = schema_only
        .file
        .messages
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(names, vec!["Owner", "Pet"]);
    assert_eq!(schema_only.file.message("Pet"), full.file.message("Pet"));
    assert_eq!(full.file.services[0].rpcs[0].output, "Pet");
}

#[test]
fn annotated_output_matches_golden() {
    let options = CompilerOptions::default()
        .with_annotation(true)
        .with_service_grouping(ServiceGrouping::Tag);
    let compiled = compile_yaml(FEATURES, &options);
    assert!(compiled.is_clean(), "{:?}", compiled.issues);
    assert_eq!(
        render(&compiled),
        include_str!("fixtures/features-annotated.proto")
    );
}

#[test]
fn document_grouping_uses_one_service() {
    let compiled = compile_yaml(FEATURES, &CompilerOptions::default());
    assert_eq!(compiled.file.services.len(), 1);
    let service = &compiled.file.services[0];
    assert_eq!(service.name, "PetStoreApiService");
    let rpcs: Vec<&str> = service.rpcs.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(rpcs, vec!["ListPets", "CreatePet", "DeletePet", "HeadHealth"]);
    assert!(service.rpcs.iter().all(|r| r.http.is_none()));
    assert!(compiled.file.imports.is_empty());
}

#[test]
fn swagger_base_path_prefixes_http_rules() {
    let compiled = compile_yaml(
        r##"
swagger: "2.0"
info: { title: Based, version: "1" }
basePath: /v1/
paths:
  /pets/{petId}:
    put:
      operationId: updatePet
      parameters:
        - { name: petId, in: path, required: true, type: string }
        - name: pet
          in: body
          schema: { $ref: "#/definitions/Pet" }
      responses:
        '200': { description: ok }
definitions:
  Pet:
    type: object
    properties:
      name: { type: string }
"##,
        &CompilerOptions::default().with_annotation(true),
    );
    let rpc = &compiled.file.services[0].rpcs[0];
    let rule = rpc.http.as_ref().unwrap();
    assert_eq!(rule.method, HttpMethod::Put);
    assert_eq!(rule.path, "/v1/pets/{pet_id}");
    assert_eq!(rule.body.as_deref(), Some("pet"));

    let request = compiled.file.message("UpdatePetRequest").unwrap();
    let fields: Vec<&str> = request.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, vec!["pet_id", "pet"]);
    assert_eq!(request.fields[1].field_type, FieldType::Ref("Pet".into()));
}

#[test]
fn wrap_primitives_registers_wrappers_import() {
    let compiled = compile_yaml(FEATURES, &CompilerOptions::default().with_wrap_primitives(true));
    let request = compiled.file.message("ListPetsRequest").unwrap();
    assert_eq!(
        request.fields[0].field_type,
        FieldType::WellKnown(WellKnown::Int32Value)
    );
    let pet = compiled.file.message("Pet").unwrap();
    assert_eq!(pet.fields[0].field_type, FieldType::Scalar(Scalar::Int64));
    assert_eq!(compiled.file.imports, vec!["google/protobuf/wrappers.proto"]);
}

#[test]
fn deprecated_operations_can_be_skipped() {
    let compiled = compile_yaml(
        FEATURES,
        &CompilerOptions::default().with_skip_deprecated_rpcs(true),
    );
    let service = &compiled.file.services[0];
    assert!(service.rpc("DeletePet").is_none());
    assert!(compiled.file.message("DeletePetRequest").is_none());

    let kept = compile_yaml(FEATURES, &CompilerOptions::default());
    assert!(kept.file.services[0].rpc("DeletePet").unwrap().deprecated);
}

#[test]
fn cross_document_references() {
    let mut documents = documents(MULTI_ROOT);
    assert_eq!(
        documents.missing_documents(),
        vec![
            "file:///specs/Pet.yaml".to_string(),
            "file:///specs/common.yaml".to_string(),
        ]
    );
    documents
        .insert("file:///specs/Pet.yaml", decode_yaml(MULTI_PET).unwrap())
        .unwrap();
    documents
        .insert("file:///specs/common.yaml", decode_yaml(MULTI_COMMON).unwrap())
        .unwrap();
    assert!(documents.missing_documents().is_empty());

    let compiled = compile(&documents, &CompilerOptions::default(), None).unwrap();
    assert!(compiled.is_clean());
    let names: Vec<&str> = compiled.file.messages.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Owner", "Pet", "Error"]);
    let pet = compiled.file.message("Pet").unwrap();
    assert_eq!(pet.fields[1].field_type, FieldType::Ref("Pet".into()));
}

#[test]
fn missing_reference_is_fatal() {
    let result = compile(
        &documents(
            r##"
swagger: "2.0"
info: { title: Broken, version: "1" }
definitions:
  Pet:
    type: object
    properties:
      owner: { $ref: "#/definitions/Owner" }
"##,
        ),
        &CompilerOptions::default(),
        None,
    );
    match result {
        Err(CompileError::Reference(err)) => {
            assert_eq!(err.pointer, "#/definitions/Owner");
            assert_eq!(err.document, ROOT);
        }
        other => panic!("expected reference error, got {other:?}"),
    }

    let unloaded = compile(&documents(MULTI_ROOT), &CompilerOptions::default(), None);
    assert!(matches!(unloaded, Err(CompileError::Reference(_))));
}

#[test]
fn unsupported_schemas_fail_alone() {
    let compiled = compile_yaml(
        r##"
openapi: 3.0.0
info: { title: Partial, version: "1" }
paths:
  pets:
    get:
      responses:
        '200': { description: ok }
components:
  schemas:
    Shape:
      oneOf:
        - { type: string }
        - { type: integer }
    Drawing:
      type: object
      properties:
        shape: { $ref: "#/components/schemas/Shape" }
    Pet:
      type: object
      properties:
        name: { type: string }
"##,
        &CompilerOptions::default(),
    );
    let names: Vec<&str> = compiled.file.messages.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Pet"]);
    assert!(compiled.file.services.is_empty());
    assert_eq!(compiled.issues.len(), 3);
    assert!(matches!(compiled.issues[0], CompileIssue::TypeMapping(_)));
    assert!(
        compiled
            .issues
            .iter()
            .any(|issue| matches!(issue, CompileIssue::Service(e) if e.path == "pets"))
    );
    assert!(compiled.into_strict().is_err());
}
