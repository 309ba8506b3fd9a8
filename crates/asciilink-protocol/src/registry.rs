use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use asciilink_codec::{Body, EnumTable, FieldCodec, FieldSpec, FrameCodec};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::command::Command;
use crate::error::{ProtocolError, Result};

/// Largest catalog file `from_file` accepts, in bytes.
pub const MAX_CATALOG_SIZE: usize = 1024 * 1024;

/// Name-keyed set of device commands.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command under `name`. Names are unique.
    pub fn register(&mut self, name: impl Into<String>, command: Command) -> Result<()> {
        let name = name.into();
        if self.commands.contains_key(&name) {
            return Err(ProtocolError::DuplicateCommand(name));
        }
        self.commands.insert(name, command);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Command> {
        self.commands
            .get(name)
            .ok_or_else(|| ProtocolError::UnknownCommand(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Command)> {
        self.commands.iter().map(|(name, cmd)| (name.as_str(), cmd))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Build a registry from a JSON catalog.
    ///
    /// ```json
    /// {
    ///   "tables": { "STATUS": [["Closed", "3"], ["Opened", "4"]] },
    ///   "commands": {
    ///     "position": { "query": "A:", "write": "R:", "body": { "integer": 6 } },
    ///     "status": { "query": "i:76", "body": { "table": "STATUS" } }
    ///   }
    /// }
    /// ```
    ///
    /// Tables are built once and shared by every field that names them.
    /// A table name repeated in the file fails [`ProtocolError::Catalog`];
    /// a repeated command name fails [`ProtocolError::DuplicateCommand`].
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: CatalogFile =
            serde_json::from_str(json).map_err(|err| ProtocolError::Catalog(err.to_string()))?;

        let mut tables = HashMap::with_capacity(catalog.tables.len());
        for (name, pairs) in catalog.tables {
            let width = pairs
                .first()
                .map(|(_, code)| code.len())
                .ok_or_else(|| ProtocolError::Catalog(format!("table {name:?} is empty")))?;
            let table = EnumTable::new(width, pairs)
                .map_err(|err| ProtocolError::Catalog(format!("table {name:?}: {err}")))?;
            if tables.contains_key(&name) {
                return Err(ProtocolError::Catalog(format!("duplicate table {name:?}")));
            }
            tables.insert(name, Arc::new(table));
        }

        let mut registry = Self::new();
        for (name, def) in catalog.commands {
            let command = def
                .body
                .build(&tables)
                .and_then(|body| Command::new(def.query.as_deref(), def.write.as_deref(), body))
                .map_err(|err| in_command(&name, err))?;
            registry.register(name, command)?;
        }

        debug!(
            commands = registry.len(),
            tables = tables.len(),
            "loaded command catalog"
        );
        Ok(registry)
    }

    /// Load a JSON catalog from disk, refusing files over
    /// [`MAX_CATALOG_SIZE`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|err| ProtocolError::Catalog(format!("{}: {err}", path.display())))?;

        let read_limit = u64::try_from(MAX_CATALOG_SIZE.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = String::new();
        file.take(read_limit)
            .read_to_string(&mut content)
            .map_err(|err| {
                ProtocolError::Catalog(format!("failed reading {}: {err}", path.display()))
            })?;
        if content.len() > MAX_CATALOG_SIZE {
            return Err(ProtocolError::Catalog(format!(
                "catalog too large (max {MAX_CATALOG_SIZE} bytes): {}",
                path.display()
            )));
        }

        Self::from_json(&content)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default, deserialize_with = "entries")]
    tables: Vec<(String, Vec<(String, String)>)>,
    #[serde(default, deserialize_with = "entries")]
    commands: Vec<(String, CommandDef)>,
}

/// A JSON object as its `(key, value)` pairs in file order, repeated keys
/// kept.
fn entries<'de, D, T>(deserializer: D) -> std::result::Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct Entries<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for Entries<T> {
        type Value = Vec<(String, T)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(pair) = map.next_entry()? {
                pairs.push(pair);
            }
            Ok(pairs)
        }
    }

    deserializer.deserialize_map(Entries(PhantomData))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CommandDef {
    query: Option<String>,
    write: Option<String>,
    #[serde(default)]
    body: BodyDef,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum BodyDef {
    #[default]
    Raw,
    Integer(usize),
    Table(String),
    Frame(Vec<FieldDef>),
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum FieldKind {
    Raw,
    Integer,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDef {
    width: usize,
    kind: Option<FieldKind>,
    table: Option<String>,
}

type Tables = HashMap<String, Arc<EnumTable>>;

impl BodyDef {
    fn build(&self, tables: &Tables) -> Result<Body> {
        let body: Body = match self {
            BodyDef::Raw => Body::raw(),
            BodyDef::Integer(width) => FieldCodec::integer(*width)?.into(),
            BodyDef::Table(name) => FieldCodec::Enumeration(lookup(tables, name)?).into(),
            BodyDef::Frame(fields) => {
                let specs = fields
                    .iter()
                    .map(|field| field.build(tables))
                    .collect::<Result<Vec<_>>>()?;
                FrameCodec::new(specs)?.into()
            }
        };
        Ok(body)
    }
}

impl FieldDef {
    fn build(&self, tables: &Tables) -> Result<FieldSpec> {
        let codec = match (&self.kind, &self.table) {
            (Some(_), Some(_)) => {
                return Err(ProtocolError::Catalog(
                    "field sets both kind and table".to_string(),
                ))
            }
            (_, Some(name)) => FieldCodec::Enumeration(lookup(tables, name)?),
            (Some(FieldKind::Integer), None) => FieldCodec::integer(self.width)?,
            (Some(FieldKind::Raw), None) | (None, None) => FieldCodec::Raw,
        };
        Ok(FieldSpec::new(self.width, codec))
    }
}

fn in_command(name: &str, err: ProtocolError) -> ProtocolError {
    match err {
        ProtocolError::Catalog(msg) => ProtocolError::Catalog(format!("command {name:?}: {msg}")),
        other => ProtocolError::Catalog(format!("command {name:?}: {other}")),
    }
}

fn lookup(tables: &Tables, name: &str) -> Result<Arc<EnumTable>> {
    tables
        .get(name)
        .cloned()
        .ok_or_else(|| ProtocolError::Catalog(format!("unknown table {name:?}")))
}
