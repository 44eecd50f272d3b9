use hustle_value::object::raw_slots;
use hustle_value::{Array, Cell, Header, ObjectTag, Quotation, Word, Wrapper};

/// Calls `visit` on every cell field of `object` that may point into the heap.
///
/// # Safety
/// `object` must point to a live, non-forwarded object.
pub unsafe fn visit_fields(object: *mut Header, visit: &mut dyn FnMut(&mut Cell)) {
    match (*object).tag() {
        ObjectTag::Array => {
            for cell in (*(object as *mut Array)).as_mut_slice() {
                visit(cell)
            }
        }
        ObjectTag::String => {}
        ObjectTag::Quote => {
            let quote = &mut *(object as *mut Quotation);
            visit(quote.definition.as_cell_mut());
        }
        ObjectTag::Word => {
            let word = &mut *(object as *mut Word);
            visit(word.name.as_cell_mut());
            visit(word.definition.as_cell_mut());
            visit(&mut word.properties);
        }
        ObjectTag::Wrapper => visit(&mut (*(object as *mut Wrapper)).wrapped),
        ObjectTag::Record => {
            for cell in raw_slots(object) {
                visit(cell)
            }
        }
    }
}
