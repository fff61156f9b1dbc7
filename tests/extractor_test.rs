//! Cenários completos: texto colado do portal → extração → mesclagem no
//! banco → médias derivadas.

use notas_escolaweb::models::merge_subject_map;
use notas_escolaweb::services::averaging::{self, PointsBalance};
use notas_escolaweb::{Bimester, GradeExtractor, JsonStore, SubjectCatalog, SubjectMap};

fn extractor() -> GradeExtractor {
    GradeExtractor::new(SubjectCatalog::default()).unwrap()
}

/// Aba "Notas Parciais": menu de navegação no topo, um bimestre por vez,
/// importado com o bimestre forçado pelo usuário.
#[test]
fn test_partial_grades_tab_with_forced_bimester() {
    let paste = "\
        Notas Parciais\n\
        1º Bimestre  2º Bimestre  3º Bimestre  4º Bimestre\n\
        \n\
        Física\n\
        Teste Mensal 7,0\n\
        Teste Bimestral 8,0\n\
        Teste Dirigido - \n\
        \n\
        Biologia\n\
        Teste Mensal 6,5\n\
        Teste Bimestral 5,5\n";

    let map = extractor().extract(paste, Some(Bimester::B2));

    let fisica = &map["Física"];
    assert_eq!(fisica.b2.monthly_test.as_deref(), Some("7.00"));
    assert_eq!(fisica.b2.bimester_test.as_deref(), Some("8.00"));
    assert_eq!(fisica.b2.various_work.as_deref(), Some(""));
    assert!(fisica.b1.is_empty());

    // o traço explícito não entra na média
    let derived = averaging::derive(fisica);
    assert_eq!(derived.bimester(Bimester::B2), Some(7.5));
    assert_eq!(derived.bimester(Bimester::B1), None);

    let bio = averaging::derive(&map["Biologia"]);
    assert_eq!(bio.bimester(Bimester::B2), Some(6.0));
}

/// Tela "Resultados Gerais": uma linha por matéria com as quatro médias,
/// recuperação semestral e resultado oficial.
#[test]
fn test_general_results_screen_full_year() {
    let paste = "\
        Matemática 1º Bimestre 5,0 2º Bimestre 6,0 3º Bimestre 7,0 \
        4º Bimestre 8,0 Recuperação 1º Semestre 8,0 Média Final 7,5\n\
        Geografia 1º Bimestre 9,0 2º Bimestre 8,0 3º Bimestre - 4º Bimestre -\n";

    let map = extractor().extract(paste, None);

    let math = &map["Matemática"];
    assert_eq!(math.b1.general_average.as_deref(), Some("5.00"));
    assert_eq!(math.b2.makeup_exam.as_deref(), Some("8.00"));
    assert_eq!(math.official_final_result.as_deref(), Some("7.50"));

    // recuperação vale um quarto, somada à média do semestre
    let derived = averaging::derive(math);
    assert_eq!(derived.sem1, Some(7.5));
    assert_eq!(derived.sem2, Some(7.5));
    assert_eq!(derived.final_average, Some(7.5));
    assert_eq!(derived.passed(), Some(true));
    assert_eq!(
        averaging::final_points(7.5),
        PointsBalance::Surplus(2.0)
    );

    let geo = averaging::derive(&map["Geografia"]);
    assert_eq!(geo.sem1, Some(8.5));
    assert_eq!(geo.sem2, None);
    assert_eq!(geo.final_average, Some(8.5));
}

/// Importações sucessivas se complementam: a tela geral primeiro, depois a
/// aba detalhada de um bimestre; os detalhes passam a mandar na média.
#[test]
fn test_detail_import_refines_general_import() {
    let ex = extractor();
    let mut db = SubjectMap::new();

    let general = ex.extract("Química 1º Bimestre 7,0 2º Bimestre 6,0", None);
    merge_subject_map(&mut db, &general);

    let detail = ex.extract(
        "Química Teste Mensal 8,0 Teste Bimestral 6,0",
        Some(Bimester::B1),
    );
    merge_subject_map(&mut db, &detail);

    let quimica = &db["Química"];
    // a média agregada importada antes continua guardada
    assert_eq!(quimica.b1.general_average.as_deref(), Some("7.00"));
    assert_eq!(quimica.b1.monthly_test.as_deref(), Some("8.00"));

    // mas os componentes detalhados têm prioridade no cálculo
    let derived = averaging::derive(quimica);
    assert_eq!(derived.bimester(Bimester::B1), Some(7.0));
    assert_eq!(derived.bimester(Bimester::B2), Some(6.0));
}

/// Matéria abaixo da média: situação de recuperação e pontos que faltam.
#[test]
fn test_failing_subject_reports_deficit() {
    let map = extractor().extract(
        "História 1º Bimestre 5,0 2º Bimestre 5,0 3º Bimestre 6,0 4º Bimestre 6,0",
        None,
    );

    let derived = averaging::derive(&map["História"]);
    assert_eq!(derived.final_average, Some(5.5));
    assert_eq!(derived.passed(), Some(false));
    // regra da escola: déficit final é a distância até a nota máxima
    assert_eq!(
        averaging::final_points(5.5),
        PointsBalance::Missing(4.5)
    );
}

/// O que foi extraído sobrevive a um ciclo de gravação e releitura.
#[tokio::test]
async fn test_extracted_grades_survive_persistence() {
    let path = std::env::temp_dir().join(format!(
        "notas_escolaweb_e2e_{}.json",
        std::process::id()
    ));
    let store = JsonStore::new(&path);

    let map = extractor().extract("Sociologia Teste Mensal 9,0 Teste Bimestral 8,0", None);
    store.save(&map).await.unwrap();

    let reloaded = store.load().await.unwrap();
    assert_eq!(reloaded, map);
    let derived = averaging::derive(&reloaded["Sociologia"]);
    assert_eq!(derived.bimester(Bimester::B1), Some(8.5));

    tokio::fs::remove_file(&path).await.unwrap();
}
