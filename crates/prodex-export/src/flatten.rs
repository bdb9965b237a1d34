//! Product → row flattening.
//!
//! Both row kinds hold one row per (product, variant) pair, in product order
//! then variant order.

use prodex_core::{CanonicalProduct, CanonicalVariant};

use crate::text::{clean_html_description, clean_image_url, to_proper_case};

/// Image columns in the business layout.
pub const IMAGE_SLOTS: usize = 8;

/// Origin country reported in the business layout.
pub const ORIGIN_CITY: &str = "México";

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Blank,
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    fn optional_text(value: Option<&str>) -> Self {
        value.map_or(Cell::Blank, Cell::text)
    }

    fn optional_number(value: Option<f64>) -> Self {
        value.map_or(Cell::Blank, Cell::Number)
    }

    fn flag(value: bool) -> Self {
        Cell::text(if value { "Sí" } else { "No" })
    }

    /// Rendering used by delimited-text output.
    #[must_use]
    pub fn to_field(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Blank => String::new(),
        }
    }
}

/// A row with a fixed column layout.
pub trait Row {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<Cell>;
}

/// Row of the generic "Productos" sheet and of the CSV export.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericRow {
    pub product_id: String,
    pub handle: String,
    pub title: String,
    pub description: String,
    pub vendor: String,
    pub category: String,
    pub tags: String,
    pub created_at: String,
    pub published_at: Option<String>,
    pub variant_id: String,
    pub variant_title: String,
    pub sku: String,
    pub price: f64,
    pub compare_at_price: Option<f64>,
    pub available: bool,
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub option3: Option<String>,
    pub image_urls: String,
}

impl Row for GenericRow {
    const HEADERS: &'static [&'static str] = &[
        "ID Producto",
        "Handle",
        "Título Producto",
        "Descripción",
        "Vendedor",
        "Categoría",
        "Tags",
        "Fecha Creación",
        "Publicado",
        "Fecha Publicación",
        "ID Variante",
        "Título Variante",
        "SKU",
        "Precio",
        "Precio de Comparación",
        "Disponible",
        "Opción 1",
        "Opción 2",
        "Opción 3",
        "URLs de Imágenes",
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.product_id),
            Cell::text(&self.handle),
            Cell::text(&self.title),
            Cell::text(&self.description),
            Cell::text(&self.vendor),
            Cell::text(&self.category),
            Cell::text(&self.tags),
            Cell::text(&self.created_at),
            Cell::flag(self.published_at.is_some()),
            Cell::optional_text(self.published_at.as_deref()),
            Cell::text(&self.variant_id),
            Cell::text(&self.variant_title),
            Cell::text(&self.sku),
            Cell::Number(self.price),
            Cell::optional_number(self.compare_at_price),
            Cell::flag(self.available),
            Cell::optional_text(self.option1.as_deref()),
            Cell::optional_text(self.option2.as_deref()),
            Cell::optional_text(self.option3.as_deref()),
            Cell::text(&self.image_urls),
        ]
    }
}

/// Row of the "Formato Coppel" marketplace upload sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecializedRow {
    pub category: String,
    pub sku: String,
    pub product_name: String,
    pub variant_id: String,
    pub brand: String,
    pub color: String,
    pub long_description: String,
    pub product_code: String,
    pub images: [String; IMAGE_SLOTS],
    pub seo_tags: String,
    pub size: String,
    pub available: bool,
    pub variant_title: String,
    pub list_price: f64,
    pub promo_price: Option<f64>,
}

impl Row for SpecializedRow {
    const HEADERS: &'static [&'static str] = &[
        "Categoría / Tipo de producto",
        "SKU",
        "Nombre del producto",
        "UPC",
        "ID de producto - Variante",
        "Marca (Aquí va el dato que obtienes de vendedor)",
        "Modelo",
        "Color",
        "Descripción corta",
        "Descripción larga (esta seria de la descripción que ya descargas)",
        "Ciudad de origen",
        "Material",
        "Medidas",
        "Peso del producto",
        "Código Variante (Aquí ira el código del producto)",
        "Imagen 1",
        "Imagen 2",
        "Imagen 3",
        "Imagen 4",
        "Imagen 5",
        "Imagen 6",
        "Imagen 7",
        "Imagen 8",
        "SEO (Aquí iran las Tags)",
        "Talla (Aquí iran las tallas)",
        "Disponible (Si/No)",
        "Titulo de Variante",
        "Precio Lista",
        "Precio Promo",
    ];

    fn cells(&self) -> Vec<Cell> {
        let mut cells = vec![
            Cell::text(&self.category),
            Cell::text(&self.sku),
            Cell::text(&self.product_name),
            Cell::Blank,
            Cell::text(&self.variant_id),
            Cell::text(&self.brand),
            Cell::Blank,
            Cell::text(&self.color),
            Cell::Blank,
            Cell::text(&self.long_description),
            Cell::text(ORIGIN_CITY),
            Cell::Blank,
            Cell::Blank,
            Cell::Blank,
            Cell::text(&self.product_code),
        ];
        cells.extend(self.images.iter().map(|url| {
            if url.is_empty() {
                Cell::Blank
            } else {
                Cell::text(url)
            }
        }));
        cells.extend([
            Cell::text(&self.seo_tags),
            Cell::text(&self.size),
            Cell::flag(self.available),
            Cell::text(&self.variant_title),
            Cell::Number(self.list_price),
            Cell::optional_number(self.promo_price),
        ]);
        cells
    }
}

/// Flattens products into generic and business-format rows.
#[must_use]
pub fn flatten(products: &[CanonicalProduct]) -> (Vec<GenericRow>, Vec<SpecializedRow>) {
    let mut generic = Vec::new();
    let mut specialized = Vec::new();

    for product in products {
        let images: Vec<&str> = product.images.iter().map(|u| clean_image_url(u)).collect();
        let tags = product.tags.join(", ");
        let product_name = to_proper_case(&product.title);
        let long_description = clean_html_description(&product.body_html);

        for variant in &product.variants {
            let pricing = variant.price_pair();
            generic.push(generic_row(product, variant, &tags, &images));
            specialized.push(SpecializedRow {
                category: product.product_type.clone(),
                sku: variant.sku.clone(),
                product_name: product_name.clone(),
                variant_id: variant.id.to_string(),
                brand: product.vendor.clone(),
                color: variant.option2.clone().unwrap_or_default(),
                long_description: long_description.clone(),
                product_code: product.id.to_string(),
                images: std::array::from_fn(|i| {
                    images.get(i).map(|u| (*u).to_owned()).unwrap_or_default()
                }),
                seo_tags: tags.clone(),
                size: variant.option1.clone().unwrap_or_default(),
                available: variant.available,
                variant_title: variant.title.clone(),
                list_price: pricing.list_price,
                promo_price: pricing.promo_price,
            });
        }
    }

    (generic, specialized)
}

fn generic_row(
    product: &CanonicalProduct,
    variant: &CanonicalVariant,
    tags: &str,
    images: &[&str],
) -> GenericRow {
    GenericRow {
        product_id: product.id.to_string(),
        handle: product.handle.clone(),
        title: product.title.clone(),
        description: product.body_html.clone(),
        vendor: product.vendor.clone(),
        category: product.product_type.clone(),
        tags: tags.to_owned(),
        created_at: product.created_at.clone(),
        published_at: product.published_at.clone(),
        variant_id: variant.id.to_string(),
        variant_title: variant.title.clone(),
        sku: variant.sku.clone(),
        price: variant.price_value(),
        compare_at_price: variant.compare_at_value(),
        available: variant.available,
        option1: variant.option1.clone(),
        option2: variant.option2.clone(),
        option3: variant.option3.clone(),
        image_urls: images.join(", "),
    }
}
