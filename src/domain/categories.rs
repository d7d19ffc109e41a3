//! Static category tree and category-group tables.
//!
//! The traversal plan is a fixed, ordered list of listing pages; slice order
//! is crawl order. The group table maps subcategory display names onto the
//! coarser presentation groups used downstream; anything unmapped falls back
//! to the uppercased category name.

/// One listing page in the traversal plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryPage {
    pub category: &'static str,
    pub subcategory: &'static str,
    pub path: &'static str,
}

const fn page(
    category: &'static str,
    subcategory: &'static str,
    path: &'static str,
) -> CategoryPage {
    CategoryPage {
        category,
        subcategory,
        path,
    }
}

/// The full traversal plan, in crawl order.
pub const CATEGORY_PAGES: &[CategoryPage] = &[
    // Furniture
    page("Furniture", "Sofas", "/furniture/sofas/"),
    page("Furniture", "Sectionals", "/furniture/sectionals/"),
    page("Furniture", "Accent Chairs", "/furniture/accent-chairs/"),
    page("Furniture", "Coffee Tables", "/furniture/coffee-tables/"),
    page("Furniture", "Side Tables", "/furniture/side-tables/"),
    page("Furniture", "Console Tables", "/furniture/console-tables/"),
    page("Furniture", "Media Consoles", "/furniture/media-consoles/"),
    page("Furniture", "Benches & Ottomans", "/furniture/benches-and-ottomans/"),
    page("Furniture", "Dining Tables", "/furniture/dining-tables/"),
    page("Furniture", "Dining Chairs", "/furniture/dining-chairs/"),
    page("Furniture", "Bar & Counter Stools", "/furniture/bar-counter-stools/"),
    page(
        "Furniture",
        "Dining Banquettes & Benches",
        "/furniture/dining-banquettes-benches/",
    ),
    page(
        "Furniture",
        "Bar Cabinets & Credenzas",
        "/furniture/bar-cabinets-credenzas/",
    ),
    page("Furniture", "Beds", "/furniture/beds/"),
    page("Furniture", "Nightstands", "/furniture/nightstands/"),
    page("Furniture", "Dressers", "/furniture/dressers/"),
    page("Furniture", "Mattresses", "/furniture/mattresses/"),
    page("Furniture", "Desks", "/furniture/desks/"),
    page("Furniture", "Office Chairs", "/furniture/office-chairs/"),
    page("Furniture", "Bookcases", "/furniture/bookcases/"),
    page("Furniture", "Storage Cabinets", "/furniture/storage-cabinets/"),
    // Outdoor
    page(
        "Outdoor",
        "Outdoor Sofas & Sectionals",
        "/outdoor/outdoor-sofas-sectionals/",
    ),
    page(
        "Outdoor",
        "Outdoor Lounge Chairs & Chaises",
        "/outdoor/outdoor-lounge-chairs-chaises/",
    ),
    page("Outdoor", "Outdoor Coffee Tables", "/outdoor/outdoor-coffee-tables/"),
    page("Outdoor", "Outdoor Side Tables", "/outdoor/outdoor-side-tables/"),
    page(
        "Outdoor",
        "Outdoor Ottomans & Poufs",
        "/outdoor/outdoor-ottomans-poufs/",
    ),
    page("Outdoor", "Outdoor Dining Tables", "/outdoor/outdoor-dining-tables/"),
    page("Outdoor", "Outdoor Dining Chairs", "/outdoor/outdoor-dining-chairs/"),
    page("Outdoor", "Outdoor Planters", "/outdoor/outdoor-planters/"),
    page("Outdoor", "Outdoor Accessories", "/outdoor/outdoor-accessories/"),
    page("Outdoor", "Outdoor Throw Pillows", "/outdoor/outdoor-throw-pillows/"),
    page("Outdoor", "Outdoor Rugs", "/outdoor/outdoor-rugs/"),
    page("Outdoor", "Outdoor Umbrellas", "/outdoor/outdoor-umbrellas/"),
    page(
        "Outdoor",
        "Outdoor Lighting & Lanterns",
        "/outdoor/outdoor-lighting-lanterns/",
    ),
    page("Outdoor", "Outdoor Entertaining", "/outdoor/outdoor-entertaining/"),
    page("Outdoor", "Outdoor Hardware", "/outdoor/outdoor-hardware/"),
    // Lighting
    page(
        "Lighting",
        "Pendant Lights & Chandeliers",
        "/lighting/pendant-lights-chandeliers/",
    ),
    page("Lighting", "Table Lamps", "/lighting/table-lamps/"),
    page("Lighting", "Floor Lamps", "/lighting/floor-lamps/"),
    page("Lighting", "Flush Mounts", "/lighting/flush-mounts/"),
    page("Lighting", "Wall Sconces", "/lighting/wall-sconces/"),
    // Rugs
    page("Rugs", "Area Rugs", "/rugs/area-rugs/"),
    page("Rugs", "Runner Rugs", "/rugs/runner-rugs/"),
    page("Rugs", "Doormats", "/rugs/doormats/"),
    page("Rugs", "Outdoor Rugs", "/rugs/outdoor-rugs/"),
    // Decor
    page("Decor", "Wall Mirrors", "/accessories/wall-mirrors/"),
    page("Decor", "Floor Mirrors", "/accessories/floor-mirrors/"),
    page("Decor", "Wall Art", "/accessories/wall-art/"),
    page("Decor", "Wallpaper", "/accessories/wallpaper/"),
    page("Decor", "Picture Frames", "/accessories/picture-frames/"),
    page("Decor", "Wall Shelves & Hooks", "/accessories/wall-shelves-hooks/"),
    page("Decor", "Throw Pillows", "/accessories/throw-pillows/"),
    page("Decor", "Poufs", "/accessories/poufs/"),
    page("Decor", "Throw Blankets", "/accessories/throw-blankets/"),
    page("Decor", "Pillow Inserts", "/accessories/pillow-inserts/"),
    page(
        "Decor",
        "Vases & Planters",
        "/accessories/vases-planters-botanicals/",
    ),
    page(
        "Decor",
        "Candles & Fragrances",
        "/accessories/candlelight-home-fragrances/",
    ),
    page("Decor", "Music Games & Books", "/accessories/music-games-books/"),
    page("Decor", "Decorative Accents", "/accessories/decorative-accents/"),
    page("Decor", "Decorative Storage", "/accessories/decorative-storage/"),
    page("Decor", "Office Accessories", "/accessories/office-accessories/"),
    page("Decor", "Fireplace Accessories", "/accessories/fireplace-accessories/"),
    page("Decor", "Cabinet Hardware", "/accessories/cabinet-hardware/"),
    page("Decor", "Curtains", "/accessories/curtains/"),
    page(
        "Decor",
        "Curtain Rods & Hardware",
        "/accessories/curtain-rods-hardware/",
    ),
    // Bedding & Bath
    page("Bedding & Bath", "Duvet Covers", "/bed-and-bath/duvet-covers/"),
    page(
        "Bedding & Bath",
        "Quilts & Blankets",
        "/bed-and-bath/quilts-bed-blankets/",
    ),
    page("Bedding & Bath", "Sheet Sets", "/bed-and-bath/sheet-sets/"),
    page(
        "Bedding & Bath",
        "Pillow Shams & Pillowcases",
        "/bed-and-bath/pillow-shams-pillowcases/",
    ),
    page("Bedding & Bath", "Bedding Sets", "/bed-and-bath/bedding-sets/"),
    page(
        "Bedding & Bath",
        "Bedding Essentials",
        "/bed-and-bath/bedding-essentials/",
    ),
    page(
        "Bedding & Bath",
        "Bath Towels & Mats",
        "/bed-and-bath/bath-towels-bath-mats/",
    ),
    page(
        "Bedding & Bath",
        "Shower Curtains & Rings",
        "/bed-and-bath/shower-curtains-rings/",
    ),
    page("Bedding & Bath", "Bathroom Decor", "/bed-and-bath/bathroom-decor/"),
    page("Bedding & Bath", "Bathroom Lighting", "/bed-and-bath/bathroom-lighting/"),
    // Tabletop
    page("Tabletop", "Dinnerware", "/dining/dinnerware/"),
    page("Tabletop", "Drinkware & Bar", "/dining/drinkware-bar/"),
    page("Tabletop", "Serveware", "/dining/serveware/"),
    page("Tabletop", "Flatware", "/dining/flatware/"),
    page("Tabletop", "Kitchen & Table Linens", "/dining/kitchen-table-linens/"),
    page("Tabletop", "Kitchen Storage & Tools", "/dining/kitchen-storage-tools/"),
    // Gifts
    page("Gifts", "All Gifts", "/gifts/"),
];

/// Presentation groups keyed by subcategory display name.
const SUBCATEGORY_GROUPS: &[(&str, &str)] = &[
    ("Sofas", "LIVING ROOM FURNITURE"),
    ("Sectionals", "LIVING ROOM FURNITURE"),
    ("Accent Chairs", "LIVING ROOM FURNITURE"),
    ("Coffee Tables", "LIVING ROOM FURNITURE"),
    ("Side Tables", "LIVING ROOM FURNITURE"),
    ("Console Tables", "LIVING ROOM FURNITURE"),
    ("Media Consoles", "LIVING ROOM FURNITURE"),
    ("Benches & Ottomans", "LIVING ROOM FURNITURE"),
    ("Dining Tables", "DINING & KITCHEN FURNITURE"),
    ("Dining Chairs", "DINING & KITCHEN FURNITURE"),
    ("Bar & Counter Stools", "DINING & KITCHEN FURNITURE"),
    ("Dining Banquettes & Benches", "DINING & KITCHEN FURNITURE"),
    ("Beds", "BEDROOM FURNITURE"),
    ("Nightstands", "BEDROOM FURNITURE"),
    ("Desks", "OFFICE FURNITURE"),
    ("Office Chairs", "OFFICE FURNITURE"),
    ("Bookcases", "OFFICE FURNITURE"),
    ("Storage Cabinets", "STORAGE FURNITURE"),
    ("Outdoor Sofas & Sectionals", "OUTDOOR LOUNGE FURNITURE"),
    ("Outdoor Coffee Tables", "OUTDOOR LOUNGE FURNITURE"),
    ("Outdoor Dining Tables", "OUTDOOR DINING FURNITURE"),
    ("Outdoor Dining Chairs", "OUTDOOR DINING FURNITURE"),
    ("Outdoor Planters", "OUTDOOR DECOR"),
    ("Outdoor Accessories", "OUTDOOR DECOR"),
    ("Outdoor Throw Pillows", "OUTDOOR DECOR"),
    ("Outdoor Entertaining", "OUTDOOR DECOR"),
    ("Pendant Lights & Chandeliers", "LIGHTING"),
    ("Table Lamps", "LIGHTING"),
    ("Floor Lamps", "LIGHTING"),
    ("Flush Mounts", "LIGHTING"),
    ("Wall Sconces", "LIGHTING"),
    ("Area Rugs", "RUGS"),
    ("Doormats", "RUGS"),
    ("Wall Mirrors", "MIRRORS & WALL DECOR"),
    ("Floor Mirrors", "MIRRORS & WALL DECOR"),
    ("Wall Art", "MIRRORS & WALL DECOR"),
    ("Wallpaper", "MIRRORS & WALL DECOR"),
    ("Picture Frames", "MIRRORS & WALL DECOR"),
    ("Poufs", "PILLOWS & THROWS"),
    ("Pillow Inserts", "PILLOWS & THROWS"),
    ("Candles & Fragrances", "DECORATIVE ACCESSORIES"),
    ("Decorative Accents", "DECORATIVE ACCESSORIES"),
    ("Decorative Storage", "ORGANIZATION & HARDWARE"),
    ("Office Accessories", "ORGANIZATION & HARDWARE"),
    ("Fireplace Accessories", "ORGANIZATION & HARDWARE"),
    ("Cabinet Hardware", "ORGANIZATION & HARDWARE"),
    ("Curtain Rods & Hardware", "ORGANIZATION & HARDWARE"),
    ("Curtains", "CURTAINS & CURTAIN HARDWARE"),
    ("Duvet Covers", "BEDDING"),
    ("Quilts & Blankets", "BEDDING"),
    ("Sheet Sets", "BEDDING"),
    ("Pillow Shams & Pillowcases", "BEDDING"),
    ("Bedding Essentials", "BEDDING"),
    ("Bathroom Decor", "BATH"),
    ("Dinnerware", "TABLETOP"),
    ("Drinkware & Bar", "TABLETOP"),
    ("Serveware", "TABLETOP"),
    ("Flatware", "TABLETOP"),
    ("Kitchen & Table Linens", "TABLETOP"),
    ("Kitchen Storage & Tools", "TABLETOP"),
    ("All Gifts", "GIFTS"),
    ("All New", "NEW"),
    ("All Sale", "SALE"),
    ("All Rugs", "RUGS"),
    ("Decor Sale", "DECOR"),
    ("Furniture Sale", "FURNITURE"),
    ("Lighting Sale", "LIGHTING"),
    ("Outdoor Sale", "OUTDOOR"),
    ("Rugs Sale", "RUGS"),
    ("Sale In-Stock Tabletop", "TABLETOP"),
    ("New Lighting", "LIGHTING"),
];

/// Group for a (category, subcategory) pair. A pure function of its inputs:
/// unmapped subcategories fall back to the uppercased category, and an empty
/// category yields an empty group.
pub fn category_group(category: &str, subcategory: &str) -> String {
    SUBCATEGORY_GROUPS
        .iter()
        .find(|(sub, _)| *sub == subcategory.trim())
        .map(|(_, group)| (*group).to_string())
        .unwrap_or_else(|| category.trim().to_uppercase())
}
