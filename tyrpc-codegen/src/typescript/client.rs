//! TypeScript client rendering.
//!
//! The output file is laid out as:
//!
//! 1. header and runtime imports
//! 2. the `<Client>Options` interface
//! 3. the root client class, then one class per service, depth-first
//! 4. every model declaration, then the error type

use convert_case::{Case, Casing};
use tyrpc::{AppDefinition, Metadata, RpcDefinition, ServiceNode, Transport};

use super::{TypeScriptBackend, ID};
use crate::backend::{Backend, GeneratorConfig};
use crate::engine::Engine;
use crate::error::{CodegenError, CodegenResult};
use crate::naming::{pascal_path, string_literal};
use crate::plugin::{ClientGenerator, GeneratedFile, GeneratorOptions, GeneratorPlugin};

const RUNTIME_MODULE: &str = "@tyrpc/client";

const IS_OBJECT: &str = "function isObject(input: unknown): input is Record<string, any> {
  return typeof input === \"object\" && input !== null && !Array.isArray(input);
}";

/// Build the TypeScript generator plugin.
pub fn plugin(options: GeneratorOptions, config: GeneratorConfig) -> CodegenResult<GeneratorPlugin> {
    options.validate(ID)?;
    Ok(GeneratorPlugin::new(Box::new(TypeScriptClientGenerator::new(
        options, config,
    ))))
}

/// Renders a typed TypeScript client for an app definition.
#[derive(Debug, Clone)]
pub struct TypeScriptClientGenerator {
    options: GeneratorOptions,
    backend: TypeScriptBackend,
}

/// A procedure with its payload types resolved.
struct Method<'d> {
    name: String,
    rpc: &'d RpcDefinition,
    params: Option<String>,
    response: Option<String>,
}

impl TypeScriptClientGenerator {
    pub fn new(options: GeneratorOptions, config: GeneratorConfig) -> Self {
        Self {
            options,
            backend: TypeScriptBackend::new(config),
        }
    }

    fn indent(&self, depth: usize) -> String {
        self.backend.config().indent(depth)
    }

    fn imports(&self, definition: &AppDefinition) -> String {
        let rpcs = || definition.procedures.values();
        let ws = rpcs().any(|rpc| rpc.transport == Transport::Ws);
        let sse = rpcs().any(|rpc| rpc.transport == Transport::Http && rpc.is_event_stream);
        let http = rpcs().any(|rpc| rpc.transport == Transport::Http && !rpc.is_event_stream);

        let mut names = Vec::new();
        if http {
            names.push("rpcRequest");
        }
        if sse {
            names.push("rpcSseRequest");
        }
        if ws {
            names.push("rpcWsRequest");
        }
        names.push("type HeaderMap");
        if sse {
            names.extend(["type EventStreamController", "type EventStreamHooks"]);
        }
        if ws {
            names.extend(["type WsController", "type WsHooks"]);
        }
        format!(
            "import {{ {} }} from {};",
            names.join(", "),
            string_literal(RUNTIME_MODULE)
        )
    }

    /// Root class name; also the prefix of every service and options type.
    fn client_name(&self) -> String {
        pascal_path(&self.options.client_name)
    }

    fn options_interface(&self) -> String {
        let i1 = self.indent(1);
        format!(
            "export interface {}Options {{\n{i1}baseUrl?: string;\n{i1}headers?: HeaderMap;\n}}",
            self.client_name()
        )
    }

    fn resolve<'d>(
        &self,
        engine: &Engine<'_>,
        key: &str,
        rpc: &'d RpcDefinition,
    ) -> CodegenResult<Method<'d>> {
        let lookup = |role: &str, model: &Option<String>| -> CodegenResult<Option<String>> {
            model
                .as_deref()
                .map(|model| {
                    engine
                        .model_type_name(model)
                        .ok_or_else(|| CodegenError::unresolved(format!("/procedures/{key}/{role}"), model))
                })
                .transpose()
        };
        let name = key.rsplit('.').next().unwrap_or(key);
        Ok(Method {
            name: name.to_case(Case::Camel),
            rpc,
            params: lookup("params", &rpc.params)?,
            response: lookup("response", &rpc.response)?,
        })
    }

    fn method(&self, method: &Method<'_>) -> String {
        let (i1, i2, i3) = (self.indent(1), self.indent(2), self.indent(3));
        let params = method.params.as_deref().unwrap_or("undefined");
        let response = method.response.as_deref().unwrap_or("undefined");
        let serializer = method
            .params
            .as_ref()
            .map(|p| format!("$${p}.serialize"))
            .unwrap_or_else(|| "() => \"\"".to_string());
        let parser = method
            .response
            .as_ref()
            .map(|r| format!("$${r}.parse"))
            .unwrap_or_else(|| "() => undefined".to_string());
        let url = format!(
            "(this.options.baseUrl ?? \"\") + {}",
            string_literal(&method.rpc.path)
        );
        let doc = self.backend.doc_comment(
            &Metadata {
                description: method.rpc.description.clone(),
                ..Metadata::default()
            },
            1,
        );
        let name = &method.name;

        match (method.rpc.transport, method.rpc.is_event_stream) {
            (Transport::Ws, _) => format!(
                "{doc}{i1}{name}(hooks: WsHooks<{response}> = {{}}): Promise<WsController<{params}, {response}>> {{\n\
                 {i2}return rpcWsRequest<{params}, {response}>(\n\
                 {i3}{{\n\
                 {i3}{i1}url: {url},\n\
                 {i3}{i1}headers: this.options.headers,\n\
                 {i3}{i1}parser: {parser},\n\
                 {i3}{i1}serializer: {serializer},\n\
                 {i3}}},\n\
                 {i3}hooks,\n\
                 {i2});\n\
                 {i1}}}"
            ),
            (Transport::Http, streaming) => {
                let (signature, argument) = match &method.params {
                    Some(p) => (format!("params: {p}"), "params"),
                    None => (String::new(), "undefined"),
                };
                let http_method = string_literal(method.rpc.method.as_str());
                let fields = |pad: &str| {
                    format!(
                        "{pad}url: {url},\n\
                         {pad}method: {http_method},\n\
                         {pad}headers: this.options.headers,\n\
                         {pad}params: {argument},\n\
                         {pad}parser: {parser},\n\
                         {pad}serializer: {serializer},\n"
                    )
                };
                if streaming {
                    let hooks = format!("hooks: EventStreamHooks<{response}> = {{}}");
                    let signature = if signature.is_empty() {
                        hooks
                    } else {
                        format!("{signature}, {hooks}")
                    };
                    format!(
                        "{doc}{i1}{name}({signature}): EventStreamController {{\n\
                         {i2}return rpcSseRequest<{params}, {response}>(\n\
                         {i3}{{\n{}{i3}}},\n\
                         {i3}hooks,\n\
                         {i2});\n\
                         {i1}}}",
                        fields(&format!("{i3}{i1}")),
                    )
                } else {
                    format!(
                        "{doc}{i1}async {name}({signature}): Promise<{response}> {{\n\
                         {i2}return rpcRequest<{params}, {response}>({{\n\
                         {}\
                         {i2}}});\n\
                         {i1}}}",
                        fields(&i3),
                    )
                }
            }
        }
    }

    /// Render `service` as `class_name`, then its child services.
    fn service(
        &self,
        engine: &Engine<'_>,
        class_name: &str,
        path: &[&str],
        service: &ServiceNode,
        out: &mut Vec<String>,
    ) -> CodegenResult<()> {
        let (i1, i2) = (self.indent(1), self.indent(2));
        let client = self.client_name();

        let mut fields = vec![format!("{i1}private readonly options: {client}Options;")];
        let mut init = vec![format!("{i2}this.options = options;")];
        let mut children = Vec::new();
        for (key, child) in service.services() {
            let child_path: Vec<&str> = path.iter().copied().chain([key.as_str()]).collect();
            let child_class = format!("{client}{}Service", pascal_path(&child_path.join("/")));
            let field = key.to_case(Case::Camel);
            fields.push(format!("{i1}readonly {field}: {child_class};"));
            init.push(format!("{i2}this.{field} = new {child_class}(options);"));
            children.push((child_class, child_path, child));
        }

        let mut methods = Vec::new();
        for (key, rpc) in service.rpcs() {
            let full_key: Vec<&str> = path.iter().copied().chain([key.as_str()]).collect();
            let method = self.resolve(engine, &full_key.join("."), rpc)?;
            methods.push(self.method(&method));
        }

        let mut class = format!("export class {class_name} {{\n{}\n\n", fields.join("\n"));
        class.push_str(&format!(
            "{i1}constructor(options: {client}Options = {{}}) {{\n{}\n{i1}}}\n",
            init.join("\n")
        ));
        for method in methods {
            class.push('\n');
            class.push_str(&method);
            class.push('\n');
        }
        class.push('}');
        out.push(class);

        for (child_class, child_path, child) in children {
            self.service(engine, &child_class, &child_path, child, out)?;
        }
        Ok(())
    }
}

impl ClientGenerator for TypeScriptClientGenerator {
    fn id(&self) -> &'static str {
        ID
    }

    fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    #[tracing::instrument(skip_all, fields(client = %self.options.client_name))]
    fn render(&self, definition: &AppDefinition) -> CodegenResult<Vec<GeneratedFile>> {
        self.options.validate(ID)?;
        if definition.procedures.is_empty() {
            return Err(CodegenError::NoProcedures { generator: ID });
        }
        definition.validate()?;
        let tree = definition.service_tree()?;

        let engine = Engine::new(&self.backend, &definition.models);
        let mut registry = engine.registry();
        let models = engine.generate_models(&mut registry)?;

        let errors = match definition.errors.type_id() {
            Some(_) => definition.errors.clone(),
            None => definition
                .errors
                .clone()
                .with_id(format!("{}Error", self.client_name())),
        };
        let error_bundle = engine.generate(&errors, "errors", "/errors", &mut registry)?;

        let mut sections = vec![
            "// This file was autogenerated by tyrpc. Do not modify directly.".to_string(),
            self.imports(definition),
            IS_OBJECT.to_string(),
            self.options_interface(),
        ];
        self.service(&engine, &self.client_name(), &[], &tree, &mut sections)?;
        sections.extend(models.iter().flat_map(|bundle| bundle.declarations()));
        sections.extend(error_bundle.declarations());

        tracing::debug!(
            procedures = definition.procedures.len(),
            types = registry.len(),
            "rendered client"
        );

        let mut contents = sections.join("\n\n");
        contents.push('\n');
        Ok(vec![GeneratedFile {
            path: self.options.output_file.clone(),
            contents,
        }])
    }
}
