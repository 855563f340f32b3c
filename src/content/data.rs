//! Built-in learning material.

use super::{EbookChapter, EbookItem, JlptLevel, LevelContent, SentencePair};

pub const HIRAGANA: [&str; 46] = [
    "あ", "い", "う", "え", "お", "か", "き", "く", "け", "こ", "さ", "し", "す", "せ", "そ", "た",
    "ち", "つ", "て", "と", "な", "に", "ぬ", "ね", "の", "は", "ひ", "ふ", "へ", "ほ", "ま", "み",
    "む", "め", "も", "や", "ゆ", "よ", "ら", "り", "る", "れ", "ろ", "わ", "を", "ん",
];

pub const KATAKANA: [&str; 46] = [
    "ア", "イ", "ウ", "エ", "オ", "カ", "キ", "ク", "ケ", "コ", "サ", "シ", "ス", "セ", "ソ", "タ",
    "チ", "ツ", "テ", "ト", "ナ", "ニ", "ヌ", "ネ", "ノ", "ハ", "ヒ", "フ", "ヘ", "ホ", "マ", "ミ",
    "ム", "メ", "モ", "ヤ", "ユ", "ヨ", "ラ", "リ", "ル", "レ", "ロ", "ワ", "ヲ", "ン",
];

struct LevelSeed {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    kanji_count: u32,
    vocab_count: u32,
}

const LEVELS: [LevelSeed; 4] = [
    LevelSeed {
        id: "N4",
        title: "Dasar-Dasar Fundamental",
        description: "Kuasai percakapan sehari-hari dan tata bahasa esensial.",
        kanji_count: 300,
        vocab_count: 1500,
    },
    LevelSeed {
        id: "N3",
        title: "Jembatan Menengah",
        description: "Pahami artikel sehari-hari dan ikuti percakapan.",
        kanji_count: 650,
        vocab_count: 3750,
    },
    LevelSeed {
        id: "N2",
        title: "Bisnis & Nuansa",
        description: "Pahami bahasa formal untuk lingkungan profesional.",
        kanji_count: 1000,
        vocab_count: 6000,
    },
    LevelSeed {
        id: "N1",
        title: "Kemahiran Tingkat Ahli",
        description: "Pahami topik yang kompleks, abstrak, dan akademis.",
        kanji_count: 2000,
        vocab_count: 10000,
    },
];

/// Levels as shown on a fresh dashboard: only the first one is open.
pub fn initial_levels() -> Vec<JlptLevel> {
    LEVELS
        .iter()
        .enumerate()
        .map(|(i, seed)| JlptLevel {
            id: seed.id.to_string(),
            name: seed.id.to_string(),
            title: seed.title.to_string(),
            description: seed.description.to_string(),
            kanji_count: seed.kanji_count,
            vocab_count: seed.vocab_count,
            progress: if i == 0 { 100 } else { 0 },
            unlocked: i == 0,
        })
        .collect()
}

pub fn alphabet_card() -> JlptLevel {
    JlptLevel {
        id: "ALPHABET".to_string(),
        name: "あア".to_string(),
        title: "Dasar-Dasar Alfabet".to_string(),
        description: "Pelajari Hiragana & Katakana, fondasi bahasa Jepang.".to_string(),
        kanji_count: 0,
        vocab_count: (HIRAGANA.len() + KATAKANA.len()) as u32,
        progress: 100,
        unlocked: true,
    }
}

const N4_KANJI: &[&str] = &[
    "日", "一", "国", "人", "年", "大", "十", "二", "本", "中", "見", "行", "食", "出", "入",
];

const N4_VOCAB: &[&str] = &[
    "わたし (saya)",
    "あなた (Anda)",
    "かれ (dia laki-laki)",
    "かのじょ (dia perempuan)",
    "です (adalah/to be)",
    "がくせい (siswa)",
    "せんせい (guru)",
    "かいしゃいん (karyawan)",
    "ほん (buku)",
    "えいが (film)",
    "たべます (makan)",
    "のみます (minum)",
    "みます (melihat)",
    "いきます (pergi)",
    "きます (datang)",
];

const N4_GRAMMAR: &[&str] = &[
    "Partikel が (ga) - Penanda subjek",
    "Partikel は (wa) - Penanda topik",
    "Bentuk ます (masu) kata kerja",
    "Partikel の (no) - Kepemilikan",
    "Kata tunjuk これ/それ/あれ (ini/itu)",
];

const N4_SCENARIOS: &[&str] = &[
    "Memesan di kafe",
    "Menanyakan arah",
    "Memperkenalkan diri",
    "Berbicara tentang hobi",
];

const N4_SENTENCES: &[(&str, &str)] = &[
    ("わたしはがくせいです。", "Saya adalah seorang siswa."),
    ("これはほんです。", "Ini adalah sebuah buku."),
    ("ねこがいます。", "Ada seekor kucing."),
    ("きのう、えいがをみました。", "Kemarin, saya menonton film."),
    ("これはわたしのかばんです。", "Ini adalah tas saya."),
];

const N3_KANJI: &[&str] = &[
    "政", "議", "民", "連", "対", "部", "合", "市", "内", "相", "選", "米", "力", "関", "全",
];

const N3_VOCAB: &[&str] = &[
    "情報 (じょうほう - informasi)",
    "経済 (けいざい - ekonomi)",
    "社会 (しゃかい - masyarakat)",
    "問題 (もんだい - masalah)",
    "必要 (ひつよう - perlu)",
    "場合 (ばあい - kasus/jika)",
    "理由 (りゆう - alasan)",
    "関係 (かんけい - hubungan)",
    "将来 (しょうらい - masa depan)",
    "続ける (つづける - melanjutkan)",
];

const N3_GRAMMAR: &[&str] = &[
    "~はずだ (seharusnya)",
    "~さえ (bahkan)",
    "~に対して (にたいして - terhadap)",
    "Bentuk pasif (受身形 - ukemikei)",
    "Bentuk kausatif (使役形 - shiekikei)",
];

const N3_SCENARIOS: &[&str] = &[
    "Mendiskusikan artikel berita",
    "Membuat rencana dengan teman",
    "Memahami pengumuman publik",
    "Memberikan pendapat dalam rapat",
];

const N3_SENTENCES: &[(&str, &str)] = &[
    ("このもんだいはふくざつだとおもいます。", "Saya pikir masalah ini rumit."),
    ("かれがくるはずです。", "Dia seharusnya datang."),
    ("てつだってくれて、かんしゃしています。", "Saya berterima kasih Anda telah membantu saya."),
    ("こどもにしんぶんをよませます。", "Saya membuat anak saya membaca koran."),
    ("せんせいにほめられました。", "Saya dipuji oleh guru."),
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn sentences(items: &[(&str, &str)]) -> Vec<SentencePair> {
    items
        .iter()
        .map(|(ja, meaning)| SentencePair {
            ja: ja.to_string(),
            meaning: meaning.to_string(),
        })
        .collect()
}

/// Browser and exercise material for a level. Levels without their own
/// material (N2, N1) reuse N4.
pub fn level_content(level_id: &str) -> LevelContent {
    match level_id {
        "N3" => LevelContent {
            kanji: strings(N3_KANJI),
            vocab: strings(N3_VOCAB),
            grammar: strings(N3_GRAMMAR),
            scenarios: strings(N3_SCENARIOS),
            sentences: sentences(N3_SENTENCES),
        },
        _ => LevelContent {
            kanji: strings(N4_KANJI),
            vocab: strings(N4_VOCAB),
            grammar: strings(N4_GRAMMAR),
            scenarios: strings(N4_SCENARIOS),
            sentences: sentences(N4_SENTENCES),
        },
    }
}

fn h2(text: &str) -> EbookItem {
    EbookItem::Heading(text.to_string())
}

fn p(text: &str) -> EbookItem {
    EbookItem::Paragraph(text.to_string())
}

fn ex(text: &str) -> EbookItem {
    EbookItem::Example(text.to_string())
}

fn chapter(title: &str, content: Vec<EbookItem>) -> EbookChapter {
    EbookChapter {
        title: title.to_string(),
        content,
    }
}

/// E-book chapters for a level. Only N4 has a book so far.
pub fn ebook_chapters(level_id: &str) -> Vec<EbookChapter> {
    if level_id != "N4" {
        return Vec::new();
    }
    vec![
        chapter(
            "Pengantar Partikel Dasar",
            vec![
                h2("Memahami Partikel は (wa) dan が (ga)"),
                p("Partikel adalah kunci untuk memahami struktur kalimat Jepang. は (wa) menandai topik kalimat, sementara が (ga) menandai subjek. Perbedaan ini sangat penting."),
                ex("わたしはがくせいです。 (Saya adalah seorang siswa.)"),
                ex("ねこがいます。 (Ada seekor kucing.)"),
                p("Dalam kalimat pertama, \"saya\" adalah topik pembicaraan. Di kalimat kedua, \"kucing\" adalah subjek yang melakukan keberadaan."),
                h2("Partikel を (o) dan に (ni)"),
                p("を (o) menandai objek langsung dari sebuah kata kerja. に (ni) menandai tujuan, lokasi keberadaan, atau waktu spesifik."),
                ex("パンをたべます。 (Saya makan roti.)"),
                ex("がっこうにいきます。 (Saya pergi ke sekolah.)"),
                ex("しちじにおきます。 (Saya bangun jam 7.)"),
            ],
        ),
        chapter(
            "Kata Kerja Bentuk -masu",
            vec![
                h2("Bentuk Sopan Kata Kerja"),
                p("Bentuk -masu adalah bentuk kata kerja standar yang sopan, digunakan dalam percakapan sehari-hari. Ini adalah bentuk pertama yang harus Anda pelajari."),
                ex("たべます (tabemasu - makan)"),
                ex("のみます (nomimasu - minum)"),
                ex("いきます (ikimasu - pergi)"),
                p("Untuk mengubahnya menjadi bentuk negatif, ganti -masu dengan -masen."),
                ex("たべません (tabemasen - tidak makan)"),
            ],
        ),
        chapter(
            "Salam Sehari-hari",
            vec![
                h2("Salam Dasar"),
                p("Menguasai salam adalah langkah pertama untuk terdengar alami dalam bahasa Jepang."),
                ex("おはようございます (Ohayou gozaimasu - Selamat pagi)"),
                ex("こんにちは (Konnichiwa - Selamat siang/Halo)"),
                ex("こんばんは (Konbanwa - Selamat malam)"),
                ex("ありがとうございます (Arigatou gozaimasu - Terima kasih banyak)"),
                ex("すみません (Sumimasen - Maaf/Permisi)"),
            ],
        ),
        chapter(
            "Menggunakan Kata Sifat",
            vec![
                h2("Kata Sifat-i dan Kata Sifat-na"),
                p("Ada dua jenis kata sifat dalam bahasa Jepang: i-adjectives dan na-adjectives. Mereka memiliki aturan konjugasi yang berbeda."),
                ex("おおきい (ookii - besar) - i-adjective"),
                ex("しずかな (shizukana - tenang) - na-adjective"),
                p("Contoh dalam kalimat:"),
                ex("このやまはおおきいです。 (Gunung ini besar.)"),
                ex("このまちはしずかです。 (Kota ini tenang.)"),
            ],
        ),
    ]
}
