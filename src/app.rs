use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::models::{merge_subject_map, Bimester, ScoreField, SubjectCatalog, SubjectMap, YearRecord};
use crate::services::averaging::{self, PointsBalance, PASSING_GRADE};
use crate::services::{AdviceStatus, AdvisorService, GradeExtractor};
use crate::storage::JsonStore;
use crate::utils::logging;
use crate::utils::text::{format_score, parse_decimal};

/// What the user asked for on the command line.
#[derive(Debug)]
pub enum Command {
    /// Parse pasted portal text (from a file, or stdin when no path is
    /// given) and merge the result into the database.
    Import {
        path: Option<PathBuf>,
        bimester: Option<Bimester>,
    },
    /// Print averages for one subject, or for every subject with data.
    Report { subject: Option<String> },
    /// Manually set one score field ("-" records it as ungraded).
    Set {
        subject: String,
        bimester: Bimester,
        field: ScoreField,
        value: String,
    },
    /// Ask the advisory service about one subject.
    Advise { subject: String },
    /// Wipe every grade of every subject.
    Clear,
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut iter = args.iter();
        let command = match iter.next().map(|s| s.as_str()) {
            None | Some("help") | Some("--help") => Command::Help,
            Some("import") => {
                let mut path = None;
                let mut bimester = None;
                while let Some(arg) = iter.next() {
                    if arg == "--bimestre" {
                        let n = iter.next().context("--bimestre requer um número (1-4)")?;
                        bimester = Some(parse_bimester(n)?);
                    } else {
                        path = Some(PathBuf::from(arg));
                    }
                }
                Command::Import { path, bimester }
            }
            Some("report") => Command::Report {
                subject: iter.next().cloned(),
            },
            Some("set") => {
                let subject = iter.next().context("uso: set <matéria> <bimestre> <campo> <nota>")?;
                let bimester = iter.next().context("faltou o bimestre (1-4)")?;
                let field = iter.next().context("faltou o campo (tm/tb/td/media/rec)")?;
                let value = iter.next().context("faltou a nota (0-10, ou '-')")?;
                Command::Set {
                    subject: subject.clone(),
                    bimester: parse_bimester(bimester)?,
                    field: ScoreField::from_key(field)
                        .ok_or_else(|| AppError::UnknownField(field.clone()))?,
                    value: value.clone(),
                }
            }
            Some("advise") => Command::Advise {
                subject: iter
                    .next()
                    .context("uso: advise <matéria>")?
                    .clone(),
            },
            Some("clear") => Command::Clear,
            Some(other) => bail!("comando desconhecido: {}", other),
        };
        Ok(command)
    }
}

fn parse_bimester(raw: &str) -> Result<Bimester> {
    raw.parse::<u8>()
        .ok()
        .and_then(Bimester::from_ordinal)
        .ok_or_else(|| AppError::InvalidBimester(raw.to_string()).into())
}

/// Application root: owns the store, the extractor and the advisor.
pub struct App {
    config: Config,
    store: JsonStore,
    extractor: GradeExtractor,
    grades: SubjectMap,
}

impl App {
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(&config.store_path);

        let store = JsonStore::new(&config.store_path);
        let grades = store.load().await?;
        let extractor = GradeExtractor::new(SubjectCatalog::default())?;

        Ok(Self {
            config,
            store,
            extractor,
            grades,
        })
    }

    pub async fn run(mut self, command: Command) -> Result<()> {
        match command {
            Command::Import { path, bimester } => self.import(path, bimester).await?,
            Command::Report { subject } => self.report(subject)?,
            Command::Set {
                subject,
                bimester,
                field,
                value,
            } => self.set(&subject, bimester, field, &value).await?,
            Command::Advise { subject } => self.advise(&subject).await?,
            Command::Clear => {
                self.grades.clear();
                self.store.clear().await?;
                info!("🗑️ Todas as notas de todas as matérias foram apagadas");
            }
            Command::Help => print_help(),
        }
        Ok(())
    }

    async fn import(&mut self, path: Option<PathBuf>, bimester: Option<Bimester>) -> Result<()> {
        let text = match path {
            Some(path) => tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("não foi possível ler {}", path.display()))?,
            None => {
                info!("📋 Cole o texto do EscolaWeb e encerre com Ctrl+D...");
                let mut buffer = String::new();
                std::io::stdin().read_to_string(&mut buffer)?;
                buffer
            }
        };

        if text.trim().is_empty() {
            warn!("⚠️ Texto vazio, nada a importar");
            return Ok(());
        }
        if self.config.verbose_logging {
            info!("texto colado: {}", logging::truncate_text(&text, 120));
        }

        let imported = self.extractor.extract(&text, bimester);
        logging::log_import_summary(imported.len());

        if imported.is_empty() {
            warn!(
                "Certifique-se de copiar a tela completa de \"Resultados Gerais\" \
                 ou \"Notas Parciais\""
            );
            return Ok(());
        }

        for subject in imported.keys() {
            info!("  • {}", subject);
        }

        merge_subject_map(&mut self.grades, &imported);
        self.store.save(&self.grades).await?;
        Ok(())
    }

    fn report(&self, subject: Option<String>) -> Result<()> {
        if self.grades.is_empty() {
            warn!("Nenhuma nota registrada ainda. Use 'import' ou 'set'.");
            return Ok(());
        }

        match subject {
            Some(name) => {
                let canonical = self.resolve_subject(&name)?;
                match self.grades.get(&canonical) {
                    Some(record) => print_subject_report(&canonical, record),
                    None => warn!("Nenhuma nota registrada para {}", canonical),
                }
            }
            None => {
                for (name, record) in &self.grades {
                    print_subject_report(name, record);
                }
            }
        }
        Ok(())
    }

    async fn set(
        &mut self,
        subject: &str,
        bimester: Bimester,
        field: ScoreField,
        value: &str,
    ) -> Result<()> {
        let canonical = self.resolve_subject(subject)?;

        if field == ScoreField::MakeupExam && !matches!(bimester, Bimester::B2 | Bimester::B4) {
            bail!("a recuperação semestral só existe no 2º e no 4º bimestres");
        }

        let stored = if value == "-" {
            String::new()
        } else {
            let parsed = parse_decimal(value).ok_or_else(|| AppError::InvalidScore {
                value: value.to_string(),
            })?;
            if !(0.0..=10.0).contains(&parsed) {
                return Err(AppError::InvalidScore {
                    value: value.to_string(),
                }
                .into());
            }
            format_score(parsed)
        };

        let record = self.grades.entry(canonical.clone()).or_default();
        record.bimester_mut(bimester).set(field, Some(stored));
        self.store.save(&self.grades).await?;

        // recompute after every write; the derived numbers are never stored
        print_subject_report(&canonical, &self.grades[&canonical]);
        Ok(())
    }

    async fn advise(&self, subject: &str) -> Result<()> {
        let canonical = self.resolve_subject(subject)?;
        // o conselheiro analisa o estado atual, mesmo que ainda vazio
        let record = self.grades.get(&canonical).cloned().unwrap_or_default();
        let derived = averaging::derive(&record);

        info!("🤖 Consultando o conselheiro de estudos...");
        let advisor = AdvisorService::new(&self.config);
        let advice = advisor.analyze(&canonical, &record, &derived).await;

        match advice.status {
            AdviceStatus::Success => {
                println!("\n✨ Insights da IA: {}\n", canonical);
                println!("{}\n", advice.message);
                if !advice.tips.is_empty() {
                    println!("Dicas de Estudo:");
                    for tip in &advice.tips {
                        println!("  • {}", tip);
                    }
                }
            }
            AdviceStatus::Error => {
                warn!("{}", advice.message);
            }
        }
        Ok(())
    }

    fn resolve_subject(&self, name: &str) -> Result<String> {
        self.extractor
            .catalog()
            .resolve(name)
            .map(str::to_string)
            .ok_or_else(|| AppError::UnknownSubject(name.to_string()).into())
    }
}

fn points_note(balance: PointsBalance) -> String {
    match balance {
        PointsBalance::Missing(p) => format!("faltam {:.1} pts", p),
        PointsBalance::Surplus(p) => format!("sobram {:.1} pts", p),
    }
}

fn fmt_avg(value: Option<f64>) -> String {
    value.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".to_string())
}

fn print_subject_report(subject: &str, record: &YearRecord) {
    let derived = averaging::derive(record);

    println!("\n{}", "─".repeat(50));
    println!("📖 {}", subject);

    // espelho do semáforo do portal: há notas, mas nada calculável
    if derived.bimesters.iter().all(Option::is_none) && !record.is_empty() {
        println!("  ⚠️ Notas registradas, mas nenhuma média calculável ainda");
    }

    for b in Bimester::ALL {
        match derived.bimester(b) {
            Some(avg) => println!(
                "  {}: média {:.1} ({})",
                b,
                avg,
                points_note(averaging::bimester_points(avg))
            ),
            None => println!("  {}: média -", b),
        }
    }

    println!("  Média 1º Semestre: {}", fmt_avg(derived.sem1));
    println!("  Média 2º Semestre: {}", fmt_avg(derived.sem2));

    match derived.final_average {
        Some(avg) => {
            let verdict = if avg >= PASSING_GRADE {
                "APROVADO"
            } else {
                "RECUPERAÇÃO"
            };
            println!(
                "  Média Final: {:.1} {} ({})",
                avg,
                verdict,
                points_note(averaging::final_points(avg))
            );
        }
        None => println!("  Média Final: -"),
    }

    if let Some(official) = &record.official_final_result {
        println!("  Resultado oficial da escola: {}", official);
    }
}

fn print_help() {
    println!("Notas da EscolaWeb: calculadora de médias (TM, TB e TD)");
    println!();
    println!("Uso: notas-escolaweb <comando>");
    println!();
    println!("Comandos:");
    println!("  import [arquivo] [--bimestre N]  importa notas de um texto colado do portal");
    println!("                                   (sem arquivo, lê da entrada padrão)");
    println!("  report [matéria]                 mostra médias e situação");
    println!("  set <matéria> <1-4> <campo> <nota>");
    println!("                                   edita uma nota (campo: tm/tb/td/media/rec)");
    println!("  advise <matéria>                 pede dicas de estudo à IA");
    println!("  clear                            apaga todas as notas");
}
