use std::fmt;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use consorcio_core::{
    load_catalog_config, CatalogConfig, ComparisonTable, ComparisonValue, DirectorySink,
    FilterCriteria, ImportSummary, KeyValueStorage, LoadSource, Plan, PlanDraft, PlanError,
    PlanStore, PlanStoreOptions, SelectionChange, SqliteKeyValueStore, SELECTION_CAPACITY,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;

pub use commands::{
    CategoryArg, CompareArgs, CompletionsArgs, DeleteArgs, EditArgs, ExportArgs, ImportArgs,
    LanceArgs, PlanFieldArgs, PlanIdArgs, SearchArgs,
};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] consorcio_core::ConfigError),
    #[error("{0}")]
    Plan(#[from] PlanError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("arquivo de importação inválido ({0}); catálogo não alterado")]
    ImportRejected(consorcio_core::FormatError),
    #[error("required resource missing: {0}")]
    MissingResource(String),
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Catálogo de planos de consórcio", long_about = None)]
pub struct Cli {
    /// Caminho do consorcio.toml
    #[arg(long, default_value = "configs/consorcio.toml")]
    pub config: PathBuf,
    /// Caminho alternativo para o banco SQLite (substitui storage.database_path)
    #[arg(long)]
    pub database: Option<PathBuf>,
    /// Diretório alternativo para exportações (substitui export.output_dir)
    #[arg(long)]
    pub export_dir: Option<PathBuf>,
    /// Formato de saída
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lista todos os planos cadastrados
    List,
    /// Exibe um plano
    Show(PlanIdArgs),
    /// Cadastra um novo plano
    Add(PlanFieldArgs),
    /// Edita um plano existente
    Edit(EditArgs),
    /// Exclui um plano
    Delete(DeleteArgs),
    /// Filtra o catálogo
    Search(SearchArgs),
    /// Compara até quatro planos lado a lado
    Compare(CompareArgs),
    /// Lista as administradoras presentes no catálogo
    Administrators,
    /// Exporta o catálogo completo em JSON
    Export(ExportArgs),
    /// Importa um arquivo JSON, substituindo o catálogo
    Import(ImportArgs),
    /// Simulador de lance
    Lance(LanceArgs),
    /// Executa verificações de configuração e armazenamento
    Health,
    /// Gera script de autocompletar para o shell
    Completions(CompletionsArgs),
}

/// Installs the stderr subscriber. Filter comes from `CONSORCIOCTL_LOG`, default `warn`.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("CONSORCIOCTL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run(cli: Cli) -> Result<()> {
    let open = || AppContext::new(&cli);

    match &cli.command {
        Commands::List => {
            let view = open()?.list();
            render(&view, cli.format)?;
        }
        Commands::Show(args) => {
            let plan = open()?.show(&args.id)?;
            render(&plan, cli.format)?;
        }
        Commands::Add(fields) => {
            let plan = open()?.add(fields)?;
            render(&plan, cli.format)?;
        }
        Commands::Edit(args) => {
            let plan = open()?.edit(args)?;
            render(&plan, cli.format)?;
        }
        Commands::Delete(args) => {
            let stdin = io::stdin();
            let outcome = open()?.delete(args, &mut stdin.lock(), &mut io::stderr())?;
            render(&outcome, cli.format)?;
        }
        Commands::Search(args) => {
            let view = open()?.search(&args.criteria());
            render(&view, cli.format)?;
        }
        Commands::Compare(args) => {
            let report = open()?.compare(&args.ids)?;
            render(&report, cli.format)?;
        }
        Commands::Administrators => {
            let list = open()?.administrators();
            render(&list, cli.format)?;
        }
        Commands::Export(args) => {
            let outcome = open()?.export(args.output.as_deref())?;
            render(&outcome, cli.format)?;
        }
        Commands::Import(args) => {
            let outcome = open()?.import(&args.file)?;
            render(&outcome, cli.format)?;
        }
        Commands::Lance(args) => {
            render(&LanceEstimate::from(args), cli.format)?;
        }
        Commands::Health => {
            let report = open()?.health_check();
            render(&report, cli.format)?;
            if report
                .iter()
                .any(|entry| matches!(entry.status, CheckStatus::Error))
            {
                return Err(AppError::MissingResource(
                    "Uma ou mais verificações falharam".to_string(),
                ));
            }
        }
        Commands::Completions(args) => {
            let mut command = Cli::command();
            clap_complete::generate(args.shell, &mut command, "consorcioctl", &mut io::stdout());
        }
    }

    Ok(())
}

fn render<T>(value: &T, format: OutputFormat) -> Result<()>
where
    T: Serialize + DisplayFallback,
{
    match format {
        OutputFormat::Text => {
            println!("{}", value.display());
            Ok(())
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{}", json);
            Ok(())
        }
    }
}

trait DisplayFallback {
    fn display(&self) -> String;
}

/// Reads a yes/no answer; anything but an explicit yes declines.
fn confirm<R, W>(reader: &mut R, writer: &mut W, prompt: &str) -> io::Result<bool>
where
    R: BufRead,
    W: Write,
{
    write!(writer, "{prompt} [s/N] ")?;
    writer.flush()?;
    let mut answer = String::new();
    reader.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "sim" | "y" | "yes"
    ))
}

struct AppContext {
    config_path: PathBuf,
    database_path: PathBuf,
    export_dir: PathBuf,
    config: CatalogConfig,
    store: PlanStore<SqliteKeyValueStore>,
}

impl AppContext {
    fn new(cli: &Cli) -> Result<Self> {
        let config_path = cli.config.clone();
        let config = load_catalog_config(&config_path)?;

        let database_path = cli
            .database
            .clone()
            .unwrap_or_else(|| config.database_path());
        let export_dir = cli
            .export_dir
            .clone()
            .unwrap_or_else(|| config.export_dir());

        let storage = SqliteKeyValueStore::builder()
            .path(&database_path)
            .create_if_missing(true)
            .build()?;
        storage.initialize()?;
        let store = PlanStore::open_with(storage, PlanStoreOptions::from(&config))?;
        info!(
            database = %database_path.display(),
            source = ?store.load_source(),
            plans = store.len(),
            "catalog opened"
        );

        Ok(Self {
            config_path,
            database_path,
            export_dir,
            config,
            store,
        })
    }

    fn list(&self) -> CatalogView {
        CatalogView {
            total: self.store.len(),
            plans: self.store.list().to_vec(),
        }
    }

    fn show(&self, id: &str) -> Result<Plan> {
        self.store.get(id).cloned().ok_or_else(|| {
            AppError::Plan(PlanError::NotFound {
                plan_id: id.to_string(),
            })
        })
    }

    fn add(&mut self, fields: &PlanFieldArgs) -> Result<Plan> {
        let draft = fields.apply(PlanDraft::default());
        Ok(self.store.create(draft)?)
    }

    fn edit(&mut self, args: &EditArgs) -> Result<Plan> {
        let base = self.show(&args.id)?.to_draft();
        let draft = args.fields.apply(base);
        Ok(self.store.update(&args.id, draft)?)
    }

    fn delete<R, W>(
        &mut self,
        args: &DeleteArgs,
        reader: &mut R,
        writer: &mut W,
    ) -> Result<DeleteOutcome>
    where
        R: BufRead,
        W: Write,
    {
        let Some(plan) = self.store.get(&args.id) else {
            return Ok(DeleteOutcome::new(&args.id, DeleteStatus::NotFound));
        };
        if !args.yes {
            let prompt = format!(
                "Excluir o plano {} ({} / {})?",
                plan.id,
                plan.administrator,
                plan.category.label_pt()
            );
            if !confirm(reader, writer, &prompt)? {
                return Ok(DeleteOutcome::new(&args.id, DeleteStatus::Declined));
            }
        }
        let status = if self.store.delete(&args.id)? {
            DeleteStatus::Deleted
        } else {
            DeleteStatus::NotFound
        };
        Ok(DeleteOutcome::new(&args.id, status))
    }

    fn search(&self, criteria: &FilterCriteria) -> CatalogView {
        CatalogView {
            total: self.store.len(),
            plans: self.store.filter(criteria).into_iter().cloned().collect(),
        }
    }

    fn compare(&mut self, ids: &[String]) -> Result<ComparisonReport> {
        let mut ignored = Vec::new();
        for id in ids {
            match self.store.toggle_selection(id)? {
                SelectionChange::Added => {}
                SelectionChange::Removed => {
                    warn!(plan_id = %id, "plan listed twice; removed from comparison")
                }
                SelectionChange::Ignored => ignored.push(id.clone()),
            }
        }
        Ok(ComparisonReport {
            ignored,
            table: self.store.compare(),
        })
    }

    fn administrators(&self) -> AdministratorList {
        AdministratorList {
            administrators: self.store.administrators(),
        }
    }

    fn export(&self, output: Option<&Path>) -> Result<ExportOutcome> {
        let dir = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.export_dir.clone());
        let mut sink = DirectorySink::new(&dir);
        let path = self.store.export_to(&mut sink, Utc::now().date_naive())?;
        Ok(ExportOutcome {
            path,
            plans: self.store.len(),
        })
    }

    fn import(&mut self, file: &Path) -> Result<ImportOutcome> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let summary = runtime
            .block_on(self.store.import_file(file))
            .map_err(|err| match err {
                PlanError::Format(format) => AppError::ImportRejected(format),
                other => AppError::Plan(other),
            })?;
        Ok(ImportOutcome {
            file: file.to_path_buf(),
            summary,
        })
    }

    fn health_check(&self) -> Vec<HealthEntry> {
        let mut results = Vec::new();
        results.push(self.check_path("consorcio.toml", &self.config_path));
        results.push(self.check_database());
        results.push(self.check_catalog());
        results.push(self.check_directory("exports", &self.export_dir));
        results
    }

    fn check_path(&self, name: &str, path: &Path) -> HealthEntry {
        if path.exists() {
            HealthEntry::ok(name, format!("{}", path.display()))
        } else {
            HealthEntry::error(name, format!("{path} ausente", path = path.display()))
        }
    }

    fn check_directory(&self, name: &str, path: &Path) -> HealthEntry {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => HealthEntry::ok(name, format!("{}", path.display())),
            Ok(_) => HealthEntry::warn(
                name,
                format!("{path} não é diretório", path = path.display()),
            ),
            Err(_) => HealthEntry::warn(
                name,
                format!("{path} será criado na primeira exportação", path = path.display()),
            ),
        }
    }

    fn check_database(&self) -> HealthEntry {
        let name = "consorcio.sqlite";
        match self.store.storage().integrity_check() {
            Ok(result) if result.to_lowercase() == "ok" => HealthEntry::ok(
                name,
                format!("{} (integridade ok)", self.database_path.display()),
            ),
            Ok(result) => HealthEntry::warn(name, format!("integrity_check: {result}")),
            Err(err) => HealthEntry::error(name, format!("falha ao abrir: {err}")),
        }
    }

    fn check_catalog(&self) -> HealthEntry {
        let name = "catálogo";
        let key = &self.config.storage.storage_key;
        match self.store.load_source() {
            LoadSource::Stored { plans } => {
                HealthEntry::ok(name, format!("{plans} planos em {key}"))
            }
            LoadSource::Seeded { plans } => {
                HealthEntry::ok(name, format!("{plans} planos de exemplo gravados em {key}"))
            }
            LoadSource::Empty => HealthEntry::warn(name, "catálogo vazio"),
            LoadSource::Unreadable => {
                let size = self
                    .store
                    .storage()
                    .get(key)
                    .ok()
                    .flatten()
                    .map(|raw| raw.len())
                    .unwrap_or_default();
                HealthEntry::error(
                    name,
                    format!("conteúdo ilegível em {key} ({size} bytes); nada foi sobrescrito"),
                )
            }
        }
    }
}

fn money(value: f64) -> String {
    format!("R$ {value:.2}")
}

fn format_value(value: &ComparisonValue) -> String {
    match value {
        ComparisonValue::Money(amount) => money(*amount),
        ComparisonValue::Percent(percent) => format!("{percent:.2}%"),
        ComparisonValue::Months(months) => months.to_string(),
        ComparisonValue::Bid { percent, amount } => {
            format!("{percent:.2}% (~{})", money(*amount))
        }
        ComparisonValue::Text(text) => text.clone(),
        ComparisonValue::Unknown => "-".to_string(),
    }
}

fn plan_line(plan: &Plan) -> String {
    let installment = if plan.installment_value > 0.0 {
        money(plan.installment_value)
    } else {
        "-".to_string()
    };
    format!(
        "{} | {} | {} | carta={} | parcela={} | {}m | taxa={:.2}% | lance={:.2}%",
        plan.id,
        plan.administrator,
        plan.category.label_pt(),
        money(plan.credit_value),
        installment,
        plan.term_months,
        plan.admin_fee_percent,
        plan.average_bid_percent
    )
}

impl DisplayFallback for Plan {
    fn display(&self) -> String {
        let mut lines = vec![
            format!("Plano {}", self.id),
            format!("  Administradora: {}", self.administrator),
            format!("  Tipo: {}", self.category.label_pt()),
            format!("  Valor da carta: {}", money(self.credit_value)),
        ];
        if self.installment_value > 0.0 {
            lines.push(format!("  Parcela: {}", money(self.installment_value)));
        } else {
            lines.push("  Parcela: -".to_string());
        }
        lines.push(format!("  Prazo: {} meses", self.term_months));
        lines.push(format!("  Taxa Adm: {:.2}%", self.admin_fee_percent));
        lines.push(format!(
            "  Média de lance: {:.2}% (~{})",
            self.average_bid_percent,
            money(self.average_bid_amount())
        ));
        if let Some(total) = self.projected_total_paid() {
            lines.push(format!("  Total estimado em parcelas: {}", money(total)));
        }
        if let Some(group) = &self.group {
            lines.push(format!("  Grupo: {group}"));
        }
        if let Some(notes) = &self.notes {
            lines.push(format!("  Observações: {notes}"));
        }
        lines.push(format!("  Atualizado em: {}", self.updated_at.to_rfc3339()));
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogView {
    pub total: usize,
    pub plans: Vec<Plan>,
}

impl DisplayFallback for CatalogView {
    fn display(&self) -> String {
        if self.plans.is_empty() {
            return "Nenhum plano encontrado".to_string();
        }
        let mut lines: Vec<String> = self.plans.iter().map(plan_line).collect();
        if self.plans.len() != self.total {
            lines.push(format!("{} de {} planos", self.plans.len(), self.total));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeleteStatus {
    Deleted,
    Declined,
    NotFound,
}

#[derive(Debug, Serialize)]
pub struct DeleteOutcome {
    pub plan_id: String,
    pub status: DeleteStatus,
}

impl DeleteOutcome {
    fn new(plan_id: &str, status: DeleteStatus) -> Self {
        Self {
            plan_id: plan_id.to_string(),
            status,
        }
    }
}

impl DisplayFallback for DeleteOutcome {
    fn display(&self) -> String {
        match self.status {
            DeleteStatus::Deleted => format!("Plano {} excluído", self.plan_id),
            DeleteStatus::Declined => "Exclusão cancelada".to_string(),
            DeleteStatus::NotFound => format!("Plano {} não encontrado", self.plan_id),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ComparisonReport {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignored: Vec<String>,
    pub table: ComparisonTable,
}

impl DisplayFallback for ComparisonReport {
    fn display(&self) -> String {
        let mut lines = Vec::new();
        if !self.ignored.is_empty() {
            lines.push(format!(
                "Limite de {SELECTION_CAPACITY} planos atingido; ignorados: {}",
                self.ignored.join(", ")
            ));
        }
        if self.table.is_empty() {
            lines.push("Nenhum plano selecionado".to_string());
            return lines.join("\n");
        }
        let header: Vec<String> = self
            .table
            .columns
            .iter()
            .map(|column| format!("{} ({})", column.administrator, column.category.label_pt()))
            .collect();
        lines.push(format!("Campo | {}", header.join(" | ")));
        for row in &self.table.rows {
            let cells: Vec<String> = row.values.iter().map(format_value).collect();
            lines.push(format!("{} | {}", row.label, cells.join(" | ")));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct AdministratorList {
    pub administrators: Vec<String>,
}

impl DisplayFallback for AdministratorList {
    fn display(&self) -> String {
        if self.administrators.is_empty() {
            return "Nenhuma administradora cadastrada".to_string();
        }
        self.administrators.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub plans: usize,
}

impl DisplayFallback for ExportOutcome {
    fn display(&self) -> String {
        format!("{} planos exportados para {}", self.plans, self.path.display())
    }
}

#[derive(Debug, Serialize)]
pub struct ImportOutcome {
    pub file: PathBuf,
    #[serde(flatten)]
    pub summary: ImportSummary,
}

impl DisplayFallback for ImportOutcome {
    fn display(&self) -> String {
        format!(
            "{} planos importados de {} (substituíram {})",
            self.summary.imported,
            self.file.display(),
            self.summary.previous
        )
    }
}

#[derive(Debug, Serialize)]
pub struct LanceEstimate {
    pub credit_value: f64,
    pub percent: f64,
    pub amount: f64,
}

impl From<&LanceArgs> for LanceEstimate {
    fn from(args: &LanceArgs) -> Self {
        Self {
            credit_value: args.credit_value,
            percent: args.effective_percent(),
            amount: args.amount(),
        }
    }
}

impl DisplayFallback for LanceEstimate {
    fn display(&self) -> String {
        format!(
            "Lance estimado: {} ({:.2}% de {})",
            money(self.amount),
            self.percent,
            money(self.credit_value)
        )
    }
}

impl DisplayFallback for Vec<HealthEntry> {
    fn display(&self) -> String {
        let mut lines = Vec::new();
        for entry in self {
            lines.push(entry.display());
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct HealthEntry {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub enum CheckStatus {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CheckStatus::Ok => "OK",
            CheckStatus::Warn => "WARN",
            CheckStatus::Error => "ERROR",
        };
        write!(f, "{}", label)
    }
}

impl HealthEntry {
    fn ok(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Ok,
            detail: detail.into(),
        }
    }

    fn warn(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Warn,
            detail: detail.into(),
        }
    }

    fn error(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Error,
            detail: detail.into(),
        }
    }
}

impl DisplayFallback for HealthEntry {
    fn display(&self) -> String {
        format!(
            "[{status}] {name}: {detail}",
            status = self.status,
            name = self.name,
            detail = self.detail
        )
    }
}
