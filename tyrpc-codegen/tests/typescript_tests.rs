//! End-to-end tests: JSON definition in, TypeScript client out.

use tyrpc::AppDefinition;
use tyrpc_codegen::{
    typescript, ClientGenerator, CodegenError, GeneratorConfig, GeneratorOptions,
    TypeScriptClientGenerator,
};

const DEFINITION: &str = r#"{
    "arriSchemaVersion": "0.0.4",
    "procedures": {
        "posts.getPost": {
            "path": "/posts/get-post",
            "method": "get",
            "params": "PostParams",
            "response": "Post"
        },
        "posts.comments.list": {
            "path": "/posts/comments/list",
            "method": "get",
            "response": "CommentList"
        }
    },
    "models": {
        "PostParams": {
            "properties": { "postId": { "type": "string" } }
        },
        "Post": {
            "properties": {
                "id": { "type": "string" },
                "views": { "type": "uint64" },
                "status": { "enum": ["DRAFT", "PUBLISHED"] },
                "tags": { "elements": { "type": "string" } },
                "author": { "ref": "Author" }
            },
            "optionalProperties": {
                "editor": { "ref": "Author", "nullable": true }
            }
        },
        "Author": {
            "properties": { "name": { "type": "string" } },
            "metadata": { "description": "Post author", "isDeprecated": true }
        },
        "CommentList": {
            "properties": {
                "items": { "elements": { "properties": { "body": { "type": "string" } } } },
                "counts": { "values": { "type": "int32" } }
            }
        }
    },
    "errors": {
        "properties": { "code": { "type": "uint16" }, "message": { "type": "string" } }
    }
}"#;

fn render(config: GeneratorConfig) -> Result<String, CodegenError> {
    let definition = AppDefinition::from_json_str(DEFINITION).unwrap();
    let generator =
        TypeScriptClientGenerator::new(GeneratorOptions::new("BlogClient", "blog.ts"), config);
    Ok(generator.render(&definition)?.remove(0).contents)
}

fn occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[test]
fn nested_services_become_classes() {
    let contents = render(GeneratorConfig::default()).unwrap();

    assert!(contents.contains("  readonly posts: BlogClientPostsService;"));
    assert!(contents.contains("  readonly comments: BlogClientPostsCommentsService;"));
    assert!(contents.contains("export class BlogClientPostsCommentsService {"));
    assert!(contents.contains("  async list(): Promise<CommentList> {"));
    assert!(contents.contains("      url: (this.options.baseUrl ?? \"\") + \"/posts/comments/list\","));
}

#[test]
fn every_named_type_is_declared_once() {
    let contents = render(GeneratorConfig::default()).unwrap();

    assert_eq!(occurrences(&contents, "export interface Author {"), 1);
    assert_eq!(occurrences(&contents, "export type PostStatus = \"DRAFT\" | \"PUBLISHED\";"), 1);
    assert_eq!(occurrences(&contents, "export interface CommentListItemsItem {"), 1);
    assert!(contents.contains("  editor?: Author | null;"));
    assert!(contents.contains("  views: bigint;"));
    assert!(contents.contains("  counts: Record<string, number>;"));
    assert!(contents.contains("  items: CommentListItemsItem[];"));
}

#[test]
fn nested_declarations_precede_their_parent() {
    let contents = render(GeneratorConfig::default()).unwrap();

    let status = contents.find("export type PostStatus").unwrap();
    let post = contents.find("export interface Post {").unwrap();
    assert!(status < post);
}

#[test]
fn docs_follow_config() {
    let with_docs = render(GeneratorConfig::default()).unwrap();
    assert!(with_docs.contains("/**\n * Post author\n * @deprecated\n */\nexport interface Author {"));

    let without_docs = render(GeneratorConfig::new().with_generate_docs(false)).unwrap();
    assert!(!without_docs.contains("@deprecated"));
}

#[test]
fn type_prefix_applies_everywhere() {
    let contents = render(GeneratorConfig::new().with_type_prefix("Api")).unwrap();

    assert!(contents.contains("export interface ApiPost {"));
    assert!(contents.contains("  author: ApiAuthor;"));
    assert!(contents.contains("  async getPost(params: ApiPostParams): Promise<ApiPost> {"));
    assert!(contents.contains("export interface ApiBlogClientError {"));
}

#[test]
fn uint64_travels_as_string() {
    let contents = render(GeneratorConfig::default()).unwrap();

    assert!(contents.contains("JSON.stringify(input.views.toString())"));
    assert!(contents.contains("BigInt(obj.views)"));
}

#[test]
fn plugin_writes_into_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("gen/client/blog.ts");
    let definition = AppDefinition::from_json_str(DEFINITION).unwrap();

    let plugin = typescript::plugin(
        GeneratorOptions::new("BlogClient", &output),
        GeneratorConfig::default(),
    )
    .unwrap();
    plugin.generate(&definition).unwrap();

    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(written, plugin.render(&definition).unwrap()[0].contents);
}
