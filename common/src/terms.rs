//! Localized user-facing strings.

#[derive(Debug, Clone, Copy)]
pub struct Terms {
    // Chat
    pub chat_title: &'static str,
    pub chat_subtitle: &'static str,
    pub chat_placeholder: &'static str,
    pub send_button: &'static str,
    pub generating: &'static str,
    pub chat_failure: &'static str,
    pub slides_ready: &'static str,

    // Graph
    pub graph_title: &'static str,
    pub graph_subtitle: &'static str,
    pub continue_to_slideshow: &'static str,
    pub slide_node: &'static str,

    // Editor
    pub edit_slide: &'static str,
    pub select_image_title: &'static str,
    pub slide_title: &'static str,
    pub slide_content: &'static str,
    pub select_image: &'static str,
    pub no_images: &'static str,
    pub loading_images: &'static str,
    pub save_changes: &'static str,
    pub cancel: &'static str,

    // Slideshow
    pub slideshow_title: &'static str,
    pub previous: &'static str,
    pub next: &'static str,
    pub back_to_edit: &'static str,
    slide_of: &'static str,

    // Map
    pub location_marker: &'static str,

    // Errors
    pub error_loading_images: &'static str,
    pub error_generating: &'static str,
    pub try_again: &'static str,

    pub loading: &'static str,
    pub please_wait: &'static str,
}

pub const ARMENIAN: Terms = Terms {
    chat_title: "Կենսագրական Ներկայացում",
    chat_subtitle: "Ասա՛ ինձ, ո՞վ է քեզ հետաքրքրում",
    chat_placeholder: "Օրինակ՝ Լեոնարդո դա Վինչի...",
    send_button: "Ուղարկել",
    generating: "Ստեղծում է...",
    chat_failure: "Ներողություն, տեխնիկական խնդիր է տեղի ունեցել: Խնդրում եմ փորձել կրկին:",
    slides_ready: "Սլայդները պատրաստ են:",

    graph_title: "Ներկայացման Կառուցվածք",
    graph_subtitle: "Սեղմիր յուրաքանչյուր սլայդի վրա՝ խմբագրելու համար",
    continue_to_slideshow: "Անցնել ներկայացմանը",
    slide_node: "Սլայդ",

    edit_slide: "Խմբագրել Սլայդը",
    select_image_title: "Ընտրել Նկար",
    slide_title: "Վերնագիր",
    slide_content: "Բովանդակություն",
    select_image: "Ընտրել Նկար",
    no_images: "Նկարներ չկան",
    loading_images: "Նկարները բեռնվում են...",
    save_changes: "Պահպանել",
    cancel: "Չեղարկել",

    slideshow_title: "Ներկայացում",
    previous: "Նախորդը",
    next: "Հաջորդը",
    back_to_edit: "Վերադառնալ խմբագրմանը",
    slide_of: "Սլայդ {current} / {total}",

    location_marker: "Տեղադրություն",

    error_loading_images: "Չհաջողվեց բեռնել նկարները",
    error_generating: "Սխալ է տեղի ունեցել",
    try_again: "Փորձել կրկին",

    loading: "Բեռնում...",
    please_wait: "Խնդրում եմ սպասել...",
};

pub const ENGLISH: Terms = Terms {
    chat_title: "Biography Presentation",
    chat_subtitle: "Tell me, who are you interested in?",
    chat_placeholder: "For example: Leonardo da Vinci...",
    send_button: "Send",
    generating: "Generating...",
    chat_failure: "Sorry, a technical problem occurred. Please try again.",
    slides_ready: "Your slides are ready.",

    graph_title: "Presentation Structure",
    graph_subtitle: "Select any slide to edit it",
    continue_to_slideshow: "Continue to slideshow",
    slide_node: "Slide",

    edit_slide: "Edit Slide",
    select_image_title: "Select Image",
    slide_title: "Title",
    slide_content: "Content",
    select_image: "Select Image",
    no_images: "No images",
    loading_images: "Loading images...",
    save_changes: "Save",
    cancel: "Cancel",

    slideshow_title: "Slideshow",
    previous: "Previous",
    next: "Next",
    back_to_edit: "Back to editing",
    slide_of: "Slide {current} / {total}",

    location_marker: "Location",

    error_loading_images: "Could not load images",
    error_generating: "Something went wrong",
    try_again: "Try again",

    loading: "Loading...",
    please_wait: "Please wait...",
};

impl Terms {
    /// Picks the string table for a configured language name. Anything that
    /// is not recognisably English gets the Armenian table.
    pub fn for_language(language: &str) -> &'static Terms {
        match language.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => &ENGLISH,
            _ => &ARMENIAN,
        }
    }

    /// `current` is 1-based.
    pub fn slide_of(&self, current: usize, total: usize) -> String {
        self.slide_of
            .replace("{current}", &current.to_string())
            .replace("{total}", &total.to_string())
    }
}
