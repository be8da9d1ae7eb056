use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use hogar_core::{CandidateTransaction, Category, CategoryMatch};

use crate::config::ConfigError;

/// One row of the built-in merchant table.
#[derive(Debug, Clone, Copy)]
pub struct MerchantDef {
    pub keywords: &'static [&'static str],
    pub category: &'static str,
    pub sub_category: Option<&'static str>,
}

/// Built-in merchant keywords.
///
/// Order is priority: the first row with any keyword contained in the
/// uppercased description wins. Keep specific merchants above generic ones
/// (`AMAZON PRIME` before `AMAZON`, `UBER EATS` before `UBER TRIP`, `REPSOL LUZ`
/// before `REPSOL`).
pub const MERCHANT_MAPPINGS: &[MerchantDef] = &[
    MerchantDef {
        keywords: &[
            "NETFLIX", "SPOTIFY", "HBO", "DISNEY PLUS", "DISNEY+", "AMAZON PRIME", "PRIME VIDEO",
            "APPLE.COM/BILL", "YOUTUBE PREMIUM", "DAZN", "MOVISTAR PLUS", "FILMIN",
        ],
        category: "Suscripciones",
        sub_category: Some("Streaming"),
    },
    MerchantDef {
        keywords: &["ICLOUD", "GOOGLE STORAGE", "GOOGLE ONE", "MICROSOFT 365", "DROPBOX", "ADOBE"],
        category: "Suscripciones",
        sub_category: Some("Software"),
    },
    MerchantDef {
        keywords: &[
            "MERCADONA", "CARREFOUR", "LIDL", "ALDI", "EROSKI", "ALCAMPO", "HIPERCOR",
            "SUPERMERCADOS CONSUM", "AHORRAMAS", "SUPERMERCADOS DIA", "DIA RETAIL", "SUPERCOR",
            "BONPREU", "CAPRABO", "GADIS", "FROIZ", "SUPERMERCADO",
        ],
        category: "Alimentación",
        sub_category: None,
    },
    MerchantDef {
        keywords: &[
            "UBER EATS", "JUST EAT", "GLOVO", "DELIVEROO", "TELEPIZZA", "DOMINOS", "MCDONALDS",
            "BURGER KING", "KFC", "STARBUCKS", "100 MONTADITOS", "VIPS", "RESTAURANTE",
            "CAFETERIA",
        ],
        category: "Restauración",
        sub_category: None,
    },
    MerchantDef {
        keywords: &["REPSOL LUZ", "IBERDROLA", "ENDESA", "NATURGY", "HOLALUZ", "TOTALENERGIES"],
        category: "Suministros",
        sub_category: Some("Electricidad y gas"),
    },
    MerchantDef {
        keywords: &["CANAL DE ISABEL II", "AGUAS DE", "AQUALIA", "EMASESA"],
        category: "Suministros",
        sub_category: Some("Agua"),
    },
    MerchantDef {
        keywords: &[
            "MOVISTAR", "VODAFONE", "ORANGE", "YOIGO", "MASMOVIL", "PEPEPHONE", "JAZZTEL",
            "DIGI SPAIN", "LOWI",
        ],
        category: "Suministros",
        sub_category: Some("Telefonía e internet"),
    },
    MerchantDef {
        keywords: &[
            "REPSOL", "CEPSA", "MOEVE", "GALP", "SHELL", "PETRONOR", "BALLENOIL", "PLENOIL",
            "GASOLINERA", "ESTACION DE SERVICIO",
        ],
        category: "Transporte",
        sub_category: Some("Combustible"),
    },
    MerchantDef {
        keywords: &[
            "RENFE", "METRO DE", "EMT MADRID", "EMT VALENCIA", "TMB", "CABIFY", "UBER TRIP",
            "UBER BV", "UBER *", "BOLT", "FREENOW", "BLABLACAR", "BICIMAD",
        ],
        category: "Transporte",
        sub_category: Some("Transporte público"),
    },
    MerchantDef {
        keywords: &["PARKING", "APARCAMIENTO", "PEAJE", "AUTOPISTA", "TELPARK", "EMPARK", "VIA-T"],
        category: "Transporte",
        sub_category: Some("Parking y peajes"),
    },
    MerchantDef {
        keywords: &["IBERIA", "VUELING", "RYANAIR", "AIR EUROPA", "EASYJET"],
        category: "Viajes",
        sub_category: Some("Vuelos"),
    },
    MerchantDef {
        keywords: &["BOOKING.COM", "AIRBNB", "HOTEL", "HOSTAL", "PARADOR"],
        category: "Viajes",
        sub_category: Some("Alojamiento"),
    },
    MerchantDef {
        keywords: &["FARMACIA"],
        category: "Salud",
        sub_category: Some("Farmacia"),
    },
    MerchantDef {
        keywords: &["SANITAS", "ADESLAS", "DKV", "ASISA", "MAPFRE SALUD"],
        category: "Salud",
        sub_category: Some("Seguro médico"),
    },
    MerchantDef {
        keywords: &["CLINICA", "CLÍNICA", "DENTAL", "HOSPITAL", "OPTICA", "ÓPTICA", "FISIOTERAPIA"],
        category: "Salud",
        sub_category: None,
    },
    MerchantDef {
        keywords: &[
            "GIMNASIO", "BASIC FIT", "BASIC-FIT", "MCFIT", "ALTAFIT", "ANYTIME FITNESS",
            "DECATHLON",
        ],
        category: "Ocio",
        sub_category: Some("Deporte"),
    },
    MerchantDef {
        keywords: &[
            "CINESA", "YELMO", "CINES", "CINE ", "TICKETMASTER", "ENTRADAS", "STEAM",
            "PLAYSTATION", "NINTENDO",
        ],
        category: "Ocio",
        sub_category: None,
    },
    MerchantDef {
        keywords: &[
            "AMAZON", "AMZN", "EL CORTE INGLES", "EL CORTE INGLÉS", "ZARA.COM", "ZARA ESPAÑA",
            "PRIMARK", "MANGO", "IKEA", "MEDIA MARKT", "MEDIAMARKT", "FNAC", "LEROY MERLIN",
            "ALIEXPRESS", "SHEIN",
        ],
        category: "Compras",
        sub_category: None,
    },
    MerchantDef {
        keywords: &["ALQUILER"],
        category: "Vivienda",
        sub_category: Some("Alquiler"),
    },
    MerchantDef {
        keywords: &["HIPOTECA", "PRESTAMO HIPOTECARIO"],
        category: "Vivienda",
        sub_category: Some("Hipoteca"),
    },
    MerchantDef {
        keywords: &["COMUNIDAD DE PROPIETARIOS", "CDAD PROP"],
        category: "Vivienda",
        sub_category: Some("Comunidad"),
    },
    MerchantDef {
        keywords: &[
            "MAPFRE", "MUTUA MADRILEÑA", "MUTUA MADRILENA", "LINEA DIRECTA", "LÍNEA DIRECTA",
            "ALLIANZ", "GENERALI", "ZURICH", "SEGURO",
        ],
        category: "Seguros",
        sub_category: None,
    },
    MerchantDef {
        keywords: &[
            "COLEGIO", "UNIVERSIDAD", "ACADEMIA", "MATRICULA", "MATRÍCULA", "LIBRERIA", "LIBRERÍA",
            "UDEMY", "COURSERA",
        ],
        category: "Educación",
        sub_category: None,
    },
    MerchantDef {
        keywords: &["NOMINA", "NÓMINA", "SALARIO"],
        category: "Ingresos",
        sub_category: Some("Nómina"),
    },
    MerchantDef {
        keywords: &["PENSION", "PENSIÓN", "PRESTACION", "PRESTACIÓN", "SEPE"],
        category: "Ingresos",
        sub_category: Some("Prestaciones"),
    },
    MerchantDef {
        keywords: &["AGENCIA TRIBUTARIA", "AEAT", "HACIENDA", "DGT", "AYUNTAMIENTO"],
        category: "Impuestos",
        sub_category: None,
    },
    MerchantDef {
        keywords: &[
            "COMISION", "COMISIÓN", "CUOTA TARJETA", "INTERESES DEUDORES", "MANTENIMIENTO CUENTA",
        ],
        category: "Bancos",
        sub_category: Some("Comisiones"),
    },
    MerchantDef {
        keywords: &["CAJERO", "RETIRADA EFECTIVO", "REINTEGRO"],
        category: "Efectivo",
        sub_category: None,
    },
    MerchantDef {
        keywords: &["BIZUM", "TRANSFERENCIA", "TRASPASO"],
        category: "Transferencias",
        sub_category: None,
    },
];

/// A keyword rule mapping bank descriptions to a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantMapping {
    pub keywords: Vec<String>,
    pub category: String,
    #[serde(default, alias = "subCategory")]
    pub sub_category: Option<String>,
}

impl MerchantMapping {
    pub fn new(keywords: &[&str], category: &str, sub_category: Option<&str>) -> Self {
        MerchantMapping {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            category: category.to_string(),
            sub_category: sub_category.map(str::to_string),
        }
    }

    fn to_match(&self) -> CategoryMatch {
        CategoryMatch::new(self.category.clone(), self.sub_category.clone())
    }
}

/// Ordered merchant rules with keywords pre-uppercased.
#[derive(Debug, Clone, Default)]
pub struct MerchantTable {
    mappings: Vec<MerchantMapping>,
}

#[derive(Deserialize)]
struct MerchantFile {
    #[serde(default)]
    merchants: Vec<MerchantMapping>,
}

impl MerchantTable {
    pub fn new(mappings: Vec<MerchantMapping>) -> Self {
        let mappings = mappings
            .into_iter()
            .map(|m| MerchantMapping {
                keywords: m
                    .keywords
                    .iter()
                    .map(|k| k.to_uppercase())
                    .filter(|k| !k.trim().is_empty())
                    .collect(),
                ..m
            })
            .collect();
        Self { mappings }
    }

    pub fn builtin() -> Self {
        Self::new(
            MERCHANT_MAPPINGS
                .iter()
                .map(|def| MerchantMapping::new(def.keywords, def.category, def.sub_category))
                .collect(),
        )
    }

    /// `extra` rules are tried before the built-in ones when both are used.
    pub fn with_extra(extra: Vec<MerchantMapping>, include_builtin: bool) -> Self {
        let mut mappings = extra;
        if include_builtin {
            mappings.extend(Self::builtin().mappings);
        }
        Self::new(mappings)
    }

    /// Parse a `[[merchants]]` TOML document.
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let file: MerchantFile = toml::from_str(toml_content)?;
        Ok(Self::new(file.merchants))
    }

    pub fn find(&self, description: &str) -> Option<&MerchantMapping> {
        let upper = description.to_uppercase();
        self.mappings
            .iter()
            .find(|m| m.keywords.iter().any(|k| upper.contains(k.as_str())))
    }

    pub fn detect(&self, description: &str) -> Option<CategoryMatch> {
        self.find(description).map(MerchantMapping::to_match)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

fn builtin_table() -> &'static MerchantTable {
    static TABLE: OnceLock<MerchantTable> = OnceLock::new();
    TABLE.get_or_init(MerchantTable::builtin)
}

/// Look the description up in the built-in merchant table.
pub fn detect_category_from_description(description: &str) -> Option<CategoryMatch> {
    builtin_table().detect(description)
}

/// Resolve a category with the built-in merchant table.
pub fn map_category(
    raw_label: Option<&str>,
    categories: &[Category],
    description: Option<&str>,
) -> CategoryMatch {
    map_category_with(builtin_table(), raw_label, categories, description)
}

/// Resolve a category, first success wins:
/// 1. merchant keywords in `description`;
/// 2. `raw_label` equal (ignoring case) to a category name, then to a
///    subcategory name;
/// 3. `raw_label` and a category name containing one another.
///
/// Falls back to [`CategoryMatch::fallback`].
pub fn map_category_with(
    table: &MerchantTable,
    raw_label: Option<&str>,
    categories: &[Category],
    description: Option<&str>,
) -> CategoryMatch {
    if let Some(found) = description.and_then(|d| table.detect(d)) {
        return found;
    }

    let Some(label) = raw_label.map(str::trim).filter(|l| !l.is_empty()) else {
        return CategoryMatch::fallback();
    };
    let label = label.to_lowercase();

    if let Some(category) = categories.iter().find(|c| c.name.to_lowercase() == label) {
        return CategoryMatch::new(category.name.clone(), None);
    }

    for category in categories {
        if let Some(sub) = category
            .sub_categories
            .iter()
            .find(|s| s.to_lowercase() == label)
        {
            return CategoryMatch::new(category.name.clone(), Some(sub.clone()));
        }
    }

    let partial = categories.iter().find(|c| {
        let name = c.name.trim().to_lowercase();
        !name.is_empty() && (name.contains(&label) || label.contains(&name))
    });
    if let Some(category) = partial {
        return CategoryMatch::new(category.name.clone(), None);
    }

    CategoryMatch::fallback()
}

/// First subcategory of `category` whose name appears in the description.
pub fn detect_sub_category(
    description: &str,
    category: &str,
    categories: &[Category],
) -> Option<String> {
    let description = description.to_lowercase();
    let category = category.to_lowercase();

    categories
        .iter()
        .find(|c| c.name.to_lowercase() == category)?
        .sub_categories
        .iter()
        .find(|s| {
            let sub = s.trim().to_lowercase();
            !sub.is_empty() && description.contains(&sub)
        })
        .cloned()
}

/// Fill `category`/`sub_category` on a normalized transaction.
pub fn categorize_row(
    mut tx: CandidateTransaction,
    raw_label: Option<&str>,
    categories: &[Category],
    table: &MerchantTable,
) -> CandidateTransaction {
    let found = map_category_with(table, raw_label, categories, Some(&tx.description));
    let sub_category = found
        .sub_category
        .or_else(|| detect_sub_category(&tx.description, &found.category, categories));

    tx.category = Some(found.category);
    tx.sub_category = sub_category;
    tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use hogar_core::TransactionType;

    fn categories() -> Vec<Category> {
        vec![
            Category::new("1", "Alimentación", &["Supermercado", "Panadería"]),
            Category::new("2", "Ocio", &["Cine", "Conciertos"]),
            Category::new("3", "Hogar", &["Luz", "Agua", "Internet"]),
            Category::new("4", "Transporte", &["Gasolina", "Taxi"]),
        ]
    }

    fn tx(description: &str) -> CandidateTransaction {
        CandidateTransaction::new("2024-01-15", 10.0, TransactionType::Expense, description)
    }

    // ── merchant table ────────────────────────────────────────────────────────

    #[test]
    fn mercadona_is_alimentacion() {
        let found = detect_category_from_description("PAGO EN MERCADONA MADRID").unwrap();
        assert_eq!(found.category, "Alimentación");
        assert_eq!(found.sub_category, None);
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let found = detect_category_from_description("Compra netflix.com").unwrap();
        assert_eq!(found, CategoryMatch::new("Suscripciones", Some("Streaming".into())));
    }

    #[test]
    fn table_order_is_priority() {
        let prime = detect_category_from_description("AMAZON PRIME ES").unwrap();
        assert_eq!(prime.category, "Suscripciones");
        let shop = detect_category_from_description("AMAZON MARKETPLACE").unwrap();
        assert_eq!(shop.category, "Compras");

        let food = detect_category_from_description("UBER EATS PEDIDO").unwrap();
        assert_eq!(food.category, "Restauración");
        let ride = detect_category_from_description("UBER TRIP").unwrap();
        assert_eq!(ride.sub_category.as_deref(), Some("Transporte público"));

        let power = detect_category_from_description("REPSOL LUZ Y GAS").unwrap();
        assert_eq!(power.category, "Suministros");
        let fuel = detect_category_from_description("REPSOL E.S. 1234").unwrap();
        assert_eq!(fuel.sub_category.as_deref(), Some("Combustible"));
    }

    #[test]
    fn accented_keywords_match_uppercased_description() {
        let found = detect_category_from_description("Abono nómina enero").unwrap();
        assert_eq!(found.category, "Ingresos");
    }

    #[test]
    fn unknown_description_is_none() {
        assert!(detect_category_from_description("XYZZY 42").is_none());
    }

    #[test]
    fn brand_keywords_do_not_match_inside_words() {
        assert!(detect_category_from_description("FONTANERIA TUBERIAS GARCIA").is_none());
        assert!(detect_category_from_description("ESCUELA DE COCINEROS").is_none());

        let ride = detect_category_from_description("UBER BV AMSTERDAM").unwrap();
        assert_eq!(ride.sub_category.as_deref(), Some("Transporte público"));
        let film = detect_category_from_description("CINE CAPITOL").unwrap();
        assert_eq!(film.category, "Ocio");
    }

    #[test]
    fn builtin_rows_all_have_keywords() {
        let table = MerchantTable::builtin();
        assert_eq!(table.len(), MERCHANT_MAPPINGS.len());
        assert!(table.mappings.iter().all(|m| !m.keywords.is_empty()));
    }

    #[test]
    fn extra_mappings_take_priority() {
        let table = MerchantTable::with_extra(
            vec![MerchantMapping::new(&["mercadona"], "Mercado", Some("Semanal"))],
            true,
        );
        let found = table.detect("PAGO EN MERCADONA").unwrap();
        assert_eq!(found.category, "Mercado");
        assert!(table.detect("NETFLIX").is_some());
    }

    #[test]
    fn extra_mappings_alone() {
        let table = MerchantTable::with_extra(vec![MerchantMapping::new(&["gym"], "Salud", None)], false);
        assert_eq!(table.len(), 1);
        assert!(table.detect("NETFLIX").is_none());
    }

    #[test]
    fn blank_keywords_never_match() {
        let table = MerchantTable::new(vec![MerchantMapping::new(&["  "], "Nada", None)]);
        assert!(table.detect("anything").is_none());
    }

    #[test]
    fn from_toml_reads_merchants() {
        let table = MerchantTable::from_toml(
            r#"
            [[merchants]]
            keywords = ["panaderia pepe"]
            category = "Alimentación"
            sub_category = "Panadería"

            [[merchants]]
            keywords = ["club padel"]
            category = "Ocio"
            subCategory = "Deporte"
            "#,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.detect("Panaderia Pepe SL").unwrap().sub_category.as_deref(),
            Some("Panadería")
        );
        assert_eq!(
            table.detect("CLUB PADEL NORTE").unwrap().sub_category.as_deref(),
            Some("Deporte")
        );
    }

    #[test]
    fn from_toml_rejects_malformed() {
        assert!(MerchantTable::from_toml("[[merchants]]\nkeywords = 3").is_err());
    }

    // ── map_category ──────────────────────────────────────────────────────────

    #[test]
    fn description_outranks_label() {
        let found = map_category(Some("Ocio"), &categories(), Some("PAGO EN MERCADONA MADRID"));
        assert_eq!(found.category, "Alimentación");
    }

    #[test]
    fn exact_category_name_ignoring_case() {
        let found = map_category(Some("ocio"), &categories(), None);
        assert_eq!(found, CategoryMatch::new("Ocio", None));
    }

    #[test]
    fn exact_subcategory_name_resolves_parent() {
        let found = map_category(Some("LUZ"), &categories(), Some("recibo mensual"));
        assert_eq!(found, CategoryMatch::new("Hogar", Some("Luz".into())));
    }

    #[test]
    fn substring_either_direction() {
        assert_eq!(map_category(Some("Transp"), &categories(), None).category, "Transporte");
        assert_eq!(map_category(Some("Gastos de Hogar"), &categories(), None).category, "Hogar");
    }

    #[test]
    fn nothing_matches_is_otros() {
        assert_eq!(map_category(Some("Mascotas"), &categories(), None), CategoryMatch::fallback());
        assert_eq!(map_category(None, &categories(), None).category, "Otros");
        assert_eq!(map_category(None, &categories(), Some("XYZZY")).category, "Otros");
    }

    #[test]
    fn blank_label_is_absent() {
        assert_eq!(map_category(Some("   "), &categories(), None).category, "Otros");
    }

    // ── detect_sub_category ───────────────────────────────────────────────────

    #[test]
    fn subcategory_found_in_description() {
        let sub = detect_sub_category("Entradas CINE Kinepolis", "Ocio", &categories());
        assert_eq!(sub.as_deref(), Some("Cine"));
    }

    #[test]
    fn subcategory_absent_or_unknown_category() {
        assert_eq!(detect_sub_category("Entradas teatro", "Ocio", &categories()), None);
        assert_eq!(detect_sub_category("Cine", "Mascotas", &categories()), None);
    }

    // ── categorize_row ────────────────────────────────────────────────────────

    #[test]
    fn categorize_row_uses_merchant_subcategory() {
        let out = categorize_row(tx("Compra Spotify"), None, &categories(), &MerchantTable::builtin());
        assert_eq!(out.category.as_deref(), Some("Suscripciones"));
        assert_eq!(out.sub_category.as_deref(), Some("Streaming"));
    }

    #[test]
    fn categorize_row_detects_subcategory_from_host_list() {
        let out = categorize_row(tx("Pago gasolina km 12"), Some("Transporte"), &categories(), &MerchantTable::builtin());
        assert_eq!(out.category.as_deref(), Some("Transporte"));
        assert_eq!(out.sub_category.as_deref(), Some("Gasolina"));
    }

    #[test]
    fn categorize_row_falls_back_to_otros() {
        let out = categorize_row(tx("Xyzzy"), None, &categories(), &MerchantTable::builtin());
        assert_eq!(out.category.as_deref(), Some("Otros"));
        assert_eq!(out.sub_category, None);
    }
}
